//! `fprintd-verify` — claim the default device and verify (or identify)
//! one scan.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "fprintd-verify", about = "Verify a fingerprint against fprintd")]
struct Args {
    /// Finger to verify against; omit to identify over every enrolled print.
    #[arg(short = 'f', long = "finger")]
    finger: Option<String>,

    /// User to verify (defaults to the caller's own account).
    username: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    simple_logger::SimpleLogger::new().env().init().ok();
    let args = Args::parse();
    let username = args.username.unwrap_or_default();
    let finger = args.finger.unwrap_or_default();

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
    println!("Using device {}", device.object_path());

    if let Err(e) = device.claim(&username).await {
        eprintln!("failed to claim device: {e}");
        return std::process::ExitCode::FAILURE;
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    {
        let device = device.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = device
                .listen_verify_finger_selected(move |event| {
                    println!("Waiting for finger: {}", event.finger_name);
                    let _ = tx.send(Event::Selected);
                })
                .await;
        });
    }
    {
        let device = device.clone();
        tokio::spawn(async move {
            let _ = device
                .listen_verify_status(move |event| {
                    let _ = tx.send(Event::Status(event.result, event.done));
                })
                .await;
        });
    }

    println!("Scan your finger now.");
    if let Err(e) = device.verify_start(&finger).await {
        eprintln!("VerifyStart failed: {e}");
        let _ = device.release().await;
        return std::process::ExitCode::FAILURE;
    }

    let mut matched = false;
    while let Some(event) = rx.recv().await {
        if let Event::Status(result, done) = event {
            println!("Verify result: {result}");
            if done {
                matched = result == "verify-match";
                break;
            }
        }
    }

    let _ = device.verify_stop().await;
    let _ = device.release().await;

    if matched {
        std::process::ExitCode::SUCCESS
    } else {
        std::process::ExitCode::FAILURE
    }
}

enum Event {
    Selected,
    Status(String, bool),
}
