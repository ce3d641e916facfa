//! PAM authentication module driving `fprintd` verification during login.
//!
//! Mirrors the behavior of the original `pam_fprintd.so`: remote sessions
//! are rejected before the daemon is ever contacted, then up to three
//! verify attempts are made, each bounded by a 30-second timer. A timeout
//! or an unrecoverable verify result is reported as `PAM_AUTHINFO_UNAVAIL`
//! so the PAM stack falls through to another authentication method.

use std::ffi::CStr;
use std::time::Duration;

use pam::constants::{PamFlag, PamResultCode};
use pam::conv::Conv;
use pam::items::{RHost, User};
use pam::module::{PamHandle, PamHooks};
use pam::pam_hooks;

use fprintd_client::{Client, Device, VerifyFingerSelectedEvent, VerifyStatusEvent};

const MAX_TRIES: u32 = 3;
const TIMEOUT: Duration = Duration::from_secs(30);

pub struct PamFprintd;
pam_hooks!(PamFprintd);

impl PamHooks for PamFprintd {
    fn sm_authenticate(pamh: &mut PamHandle, args: Vec<&CStr>, _flags: PamFlag) -> PamResultCode {
        let debug = args.iter().any(|a| a.to_str() == Ok("debug"));

        if let Ok(Some(rhost)) = pamh.get_item::<RHost>() {
            if rhost.to_str().map(|s| !s.is_empty()).unwrap_or(false) {
                if debug {
                    log::debug!("remote session, refusing fingerprint authentication");
                }
                return PamResultCode::PAM_AUTHINFO_UNAVAIL;
            }
        }

        let username = match pamh.get_item::<User>() {
            Ok(Some(user)) => match user.to_str() {
                Ok(s) => s.to_string(),
                Err(_) => return PamResultCode::PAM_AUTHINFO_UNAVAIL,
            },
            _ => return PamResultCode::PAM_AUTHINFO_UNAVAIL,
        };

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(_) => return PamResultCode::PAM_AUTHINFO_UNAVAIL,
        };

        runtime.block_on(authenticate(pamh, &username, debug))
    }

    fn sm_setcred(_pamh: &mut PamHandle, _args: Vec<&CStr>, _flags: PamFlag) -> PamResultCode {
        PamResultCode::PAM_SUCCESS
    }

    fn sm_chauthtok(_pamh: &mut PamHandle, _args: Vec<&CStr>, _flags: PamFlag) -> PamResultCode {
        PamResultCode::PAM_SUCCESS
    }
}

async fn authenticate(pamh: &mut PamHandle, username: &str, debug: bool) -> PamResultCode {
    let client = match Client::system().await {
        Ok(c) => c,
        Err(e) => {
            if debug {
                log::debug!("connecting to fprintd failed: {e}");
            }
            return PamResultCode::PAM_AUTHINFO_UNAVAIL;
        }
    };

    let device = match fprintd_client::first_device(&client).await {
        Ok(Some(dev)) => dev,
        _ => return PamResultCode::PAM_AUTHINFO_UNAVAIL,
    };

    if device.claim(username).await.is_err() {
        return PamResultCode::PAM_AUTHINFO_UNAVAIL;
    }

    let is_swipe = device.scan_type().await.map(|s| s == "swipe").unwrap_or(false);
    let driver_name = device.name().await.unwrap_or_else(|_| "Fingerprint reader".to_string());

    let result = do_verify(pamh, &device, is_swipe, &driver_name, debug).await;

    let _ = device.release().await;
    result
}

enum VerifyEvent {
    FingerSelected(VerifyFingerSelectedEvent),
    Status(VerifyStatusEvent),
}

async fn do_verify(pamh: &mut PamHandle, device: &Device, is_swipe: bool, driver_name: &str, debug: bool) -> PamResultCode {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<VerifyEvent>();

    {
        let tx = tx.clone();
        let device = device.clone();
        tokio::spawn(async move {
            let _ = device
                .listen_verify_finger_selected(move |event| {
                    let _ = tx.send(VerifyEvent::FingerSelected(event));
                })
                .await;
        });
    }
    {
        let tx = tx.clone();
        let device = device.clone();
        tokio::spawn(async move {
            let _ = device
                .listen_verify_status(move |event| {
                    let _ = tx.send(VerifyEvent::Status(event));
                })
                .await;
        });
    }
    drop(tx);

    for attempt in 1..=MAX_TRIES {
        if debug {
            log::debug!("verify attempt {attempt}/{MAX_TRIES}");
        }
        if let Err(e) = device.verify_start("any").await {
            if debug {
                log::debug!("VerifyStart failed: {e}");
            }
            return PamResultCode::PAM_AUTHINFO_UNAVAIL;
        }

        let outcome = tokio::time::timeout(TIMEOUT, wait_for_terminal(pamh, &mut rx, is_swipe, driver_name)).await;
        let _ = device.verify_stop().await;

        let result = match outcome {
            Ok(Some(result)) => result,
            Ok(None) | Err(_) => {
                send_info(pamh, "Verification timed out");
                return PamResultCode::PAM_AUTHINFO_UNAVAIL;
            }
        };

        match result.as_str() {
            "verify-match" => return PamResultCode::PAM_SUCCESS,
            "verify-no-match" => {
                send_error(pamh, "Failed to match fingerprint");
                if attempt == MAX_TRIES {
                    return PamResultCode::PAM_AUTH_ERR;
                }
            }
            "verify-unknown-error" => return PamResultCode::PAM_AUTHINFO_UNAVAIL,
            _ => {
                send_info(pamh, "An unknown error occurred");
                return PamResultCode::PAM_AUTH_ERR;
            }
        }
    }

    PamResultCode::PAM_AUTH_ERR
}

/// Drains verify events until a terminal `VerifyStatus` arrives, surfacing
/// non-terminal status codes and finger prompts as PAM conversation
/// messages along the way.
async fn wait_for_terminal(
    pamh: &mut PamHandle,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<VerifyEvent>,
    is_swipe: bool,
    driver_name: &str,
) -> Option<String> {
    while let Some(event) = rx.recv().await {
        match event {
            VerifyEvent::FingerSelected(sel) => {
                let msg = finger_selected_message(&sel.finger_name, is_swipe, driver_name);
                send_info(pamh, &msg);
            }
            VerifyEvent::Status(status) => {
                if status.done {
                    return Some(status.result);
                }
                send_error(pamh, &retry_message(&status.result, is_swipe));
            }
        }
    }
    None
}

fn finger_selected_message(finger_name: &str, is_swipe: bool, driver_name: &str) -> String {
    let verb = if is_swipe { "Swipe" } else { "Place" };
    if finger_name == "any" {
        format!("{verb} your finger on {driver_name}")
    } else {
        format!("{verb} your {} on {driver_name}", finger_name.replace('-', " "))
    }
}

fn retry_message(code: &str, is_swipe: bool) -> String {
    match code {
        "verify-retry-scan" if is_swipe => "Swipe was too quick, please try again".to_string(),
        "verify-retry-scan" => "Please try again".to_string(),
        "verify-swipe-too-short" => "Swipe was too short, please try again".to_string(),
        "verify-finger-not-centered" => "Please center your finger on the sensor".to_string(),
        "verify-remove-and-retry" => "Please remove your finger and try again".to_string(),
        other => other.to_string(),
    }
}

fn send_info(pamh: &mut PamHandle, msg: &str) {
    if let Ok(Some(conv)) = pamh.get_item::<Conv>() {
        let _ = conv.send_info(msg);
    }
}

fn send_error(pamh: &mut PamHandle, msg: &str) {
    if let Ok(Some(conv)) = pamh.get_item::<Conv>() {
        let _ = conv.send_error(msg);
    }
}
