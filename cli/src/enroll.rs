//! `fprintd-enroll` — claim the default device and enroll one finger.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "fprintd-enroll", about = "Enroll a fingerprint with fprintd")]
struct Args {
    /// Finger to enroll (defaults to right-index-finger).
    #[arg(short = 'f', long = "finger", default_value = "right-index-finger")]
    finger: String,

    /// User to enroll (defaults to the caller's own account).
    username: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    simple_logger::SimpleLogger::new().env().init().ok();
    let args = Args::parse();
    let username = args.username.unwrap_or_default();

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

    let stages = device.num_enroll_stages().await.unwrap_or(-1);
    println!("Enrolling {} ({stages} stages).", args.finger);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    {
        let device = device.clone();
        tokio::spawn(async move {
            let _ = device
                .listen_enroll_status(move |event| {
                    let _ = tx.send(event);
                })
                .await;
        });
    }

    if let Err(e) = device.enroll_start(&args.finger).await {
        eprintln!("EnrollStart failed: {e}");
        let _ = device.release().await;
        return std::process::ExitCode::FAILURE;
    }

    let mut completed = false;
    let mut ok = false;
    while let Some(event) = rx.recv().await {
        println!("Enroll result: {}", event.result);
        if event.done {
            ok = event.result == "enroll-completed";
            completed = true;
            break;
        }
    }

    let _ = device.enroll_stop().await;
    let _ = device.release().await;

    if !completed || !ok {
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
