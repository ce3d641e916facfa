//! `fprintd-list` — list enrolled fingers for one or more users.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "fprintd-list", about = "List fingerprints enrolled with fprintd")]
struct Args {
    /// Users to list enrolled fingers for.
    #[arg(required = true)]
    users: Vec<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    simple_logger::SimpleLogger::new().env().init().ok();
    let args = Args::parse();

    let client = match fprintd_client::Client::system().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to connect to fprintd: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let device = match fprintd_client::first_device(&client).await {
        Ok(Some(dev)) => dev,
        Ok(None) => {
            eprintln!("No devices found");
            return std::process::ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("GetDefaultDevice failed: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    if let Err(e) = device.claim("").await {
        eprintln!("failed to claim device: {e}");
        return std::process::ExitCode::FAILURE;
    }

    let mut exit_code = std::process::ExitCode::SUCCESS;
    for user in &args.users {
        match device.list_enrolled_fingers(user).await {
            Ok(fingers) if !fingers.is_empty() => {
                println!("Fingerprints for user {user}:");
                for finger in fingers {
                    println!(" - {finger}");
                }
            }
            Ok(_) => {
                println!("No fingerprints enrolled for user {user}");
            }
            Err(e) => {
                eprintln!("No fingerprints enrolled for user {user} ({e})");
                exit_code = std::process::ExitCode::FAILURE;
            }
        }
    }

    let _ = device.release().await;
    exit_code
}
