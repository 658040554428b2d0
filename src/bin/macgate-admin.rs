//! Management CLI for the macgate permission store.
//!
//! This is the administrative collaborator: it performs the writes the
//! responder only ever reads. Changes are visible to the running responder
//! as soon as they commit.

use clap::{Parser, Subcommand};

use macgate::config::DatabaseConfig;
use macgate::mac;
use macgate::store::{DeviceStore, SqliteStore};

#[derive(Parser)]
#[command(name = "macgate-admin")]
#[command(about = "Administrative CLI for the macgate permission store", long_about = None)]
struct Cli {
    /// SQLite connection URL (must match the responder's).
    #[arg(short, long, default_value = "sqlite://macgate.db")]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a device address
    AddDevice { mac: String },
    /// Delete a device and its group memberships
    RemoveDevice { mac: String },
    /// List registered devices
    Devices,
    /// Create a device group
    AddGroup { name: String },
    /// Delete a group and its associations
    RemoveGroup { name: String },
    /// List device groups
    Groups,
    /// Register a wireless network
    AddNetwork { ssid: String },
    /// Delete a network
    RemoveNetwork { ssid: String },
    /// List networks
    Networks,
    /// Put a device into a group
    Assign { mac: String, group: String },
    /// Take a device out of a group
    Unassign { mac: String, group: String },
    /// Authorize a group for a network
    Grant { group: String, ssid: String },
    /// Withdraw a group's network authorization
    Revoke { group: String, ssid: String },
    /// Show a device's groups and authorized networks
    Authorized { mac: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = DatabaseConfig {
        url: cli.database.clone(),
        ..DatabaseConfig::default()
    };
    let store = SqliteStore::connect(&config).await?;

    match cli.command {
        Commands::AddDevice { mac } => {
            let device = store.add_device(&mac).await?;
            println!("added device {}", mac::pretty(&device.mac));
        }
        Commands::RemoveDevice { mac } => {
            store.remove_device(&mac).await?;
            println!("removed device");
        }
        Commands::Devices => {
            for device in store.list_devices().await? {
                println!(
                    "{}\tadded {}",
                    mac::pretty(&device.mac),
                    device.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        Commands::AddGroup { name } => {
            store.add_group(&name).await?;
            println!("added group {name}");
        }
        Commands::RemoveGroup { name } => {
            store.remove_group(&name).await?;
            println!("removed group {name}");
        }
        Commands::Groups => {
            for group in store.list_groups().await? {
                println!("{}", group.name);
            }
        }
        Commands::AddNetwork { ssid } => {
            store.add_network(&ssid).await?;
            println!("added network {ssid}");
        }
        Commands::RemoveNetwork { ssid } => {
            store.remove_network(&ssid).await?;
            println!("removed network {ssid}");
        }
        Commands::Networks => {
            for network in store.list_networks().await? {
                println!("{}", network.ssid);
            }
        }
        Commands::Assign { mac, group } => {
            store.assign_device_to_group(&mac, &group).await?;
            println!("assigned");
        }
        Commands::Unassign { mac, group } => {
            store.unassign_device_from_group(&mac, &group).await?;
            println!("unassigned");
        }
        Commands::Grant { group, ssid } => {
            store.grant_network_to_group(&group, &ssid).await?;
            println!("granted");
        }
        Commands::Revoke { group, ssid } => {
            store.revoke_network_from_group(&group, &ssid).await?;
            println!("revoked");
        }
        Commands::Authorized { mac: raw } => {
            let canonical = mac::normalize(&raw);
            match store.find_device(&canonical).await? {
                Some(record) => {
                    println!("device {}", mac::pretty(&record.device.mac));
                    for group in &record.groups {
                        println!("  group   {}", group.name);
                    }
                    for network in &record.networks {
                        println!("  network {}", network.ssid);
                    }
                }
                None => println!("device {raw} is not registered"),
            }
        }
    }

    Ok(())
}
