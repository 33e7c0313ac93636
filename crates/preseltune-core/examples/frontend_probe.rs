//! Front-End Communication Test Tool
//!
//! A standalone tool to test and debug serial communication with the
//! preselector front-end. Discovers the device, polls its status, and can
//! exercise the bypass relay and filter stepper.
//!
//! Usage:
//!   cargo run --example frontend_probe -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: auto-discover)
//!   --baud RATE       Baud rate (default: 9600)
//!   --timeout MS      Read timeout in ms (default: 3000)
//!   --polls N         Number of 1 Hz status polls (default: 5)
//!   --toggle-bypass   Toggle the bypass relay between polls
//!   --step DELTA      Issue one filter step (-10, -1, 1 or 10)

use std::time::Duration;

use preseltune_core::protocol::{find_device, Commander, ConnectionConfig, ProtocolError};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name: Option<String> = None;
    let mut baud_rate = 9600u32;
    let mut timeout_ms = 3000u64;
    let mut polls = 5u32;
    let mut toggle_bypass = false;
    let mut step: Option<i32> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                if i < args.len() {
                    port_name = Some(args[i].clone());
                }
            }
            "--baud" | "-b" => {
                i += 1;
                if i < args.len() {
                    baud_rate = args[i].parse().unwrap_or(9600);
                }
            }
            "--timeout" | "-t" => {
                i += 1;
                if i < args.len() {
                    timeout_ms = args[i].parse().unwrap_or(3000);
                }
            }
            "--polls" | "-n" => {
                i += 1;
                if i < args.len() {
                    polls = args[i].parse().unwrap_or(5);
                }
            }
            "--toggle-bypass" => {
                toggle_bypass = true;
            }
            "--step" => {
                i += 1;
                if i < args.len() {
                    step = args[i].parse().ok();
                }
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            arg if !arg.starts_with('-') => {
                port_name = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
            }
        }
        i += 1;
    }

    // Discover the device when no port was named
    let port_name = match port_name {
        Some(name) => name,
        None => {
            println!("Scanning serial ports for the front-end...");
            match find_device() {
                Some(name) => {
                    println!("✓ Front-end found on {}", name);
                    name
                }
                None => {
                    eprintln!("❌ No port answered the status probe.");
                    eprintln!("   Pass one explicitly: --port /dev/ttyUSB0");
                    return;
                }
            }
        }
    };

    println!("Configuration:");
    println!("  Port:          {}", port_name);
    println!("  Baud rate:     {}", baud_rate);
    println!("  Read timeout:  {}ms", timeout_ms);
    println!();

    let mut commander = Commander::new(ConnectionConfig {
        port_name,
        baud_rate,
        timeout_ms,
    });

    if let Some(delta) = step {
        match commander.step_filter(delta) {
            Ok(()) => println!("✓ Filter step {delta:+} sent"),
            Err(e) => {
                eprintln!("❌ Filter step failed: {e}");
                return;
            }
        }
    }

    let mut bypass_state = false;
    for poll in 1..=polls {
        if toggle_bypass {
            bypass_state = !bypass_state;
            match commander.set_bypass(bypass_state) {
                Ok(()) => println!("✓ Bypass {}", if bypass_state { "ON" } else { "OFF" }),
                Err(e) => {
                    eprintln!("❌ Bypass command failed: {e}");
                    return;
                }
            }
        }

        print!("[{poll}/{polls}] ");
        report_status(&mut commander);

        if let Err(e) = commander.check_for_error() {
            eprintln!("❌ Device fault: {e}");
        }

        if poll < polls {
            std::thread::sleep(Duration::from_secs(1));
        }
    }
}

fn report_status(commander: &mut Commander) {
    match commander.get_status() {
        Ok(Some(status)) => {
            println!(
                "✓ {} MHz | bypass {} | force TX {}",
                status.frequency().unwrap_or("?"),
                flag(status.bypass_active()),
                flag(status.force_tx_active()),
            );
        }
        Ok(None) => println!("⚠ No response within the timeout window"),
        Err(ProtocolError::BadResponse(line)) => {
            println!("❌ Unexpected response: {line:?} (wrong port selected?)");
        }
        Err(e) => println!("❌ Status poll failed: {e}"),
    }
}

fn flag(state: Option<bool>) -> &'static str {
    match state {
        Some(true) => "ON",
        Some(false) => "off",
        None => "?",
    }
}

fn print_help() {
    println!("Front-End Communication Test Tool");
    println!();
    println!("Usage: frontend_probe [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  --port, -p PORT     Serial port (default: auto-discover)");
    println!("  --baud, -b RATE     Baud rate (default: 9600)");
    println!("  --timeout, -t MS    Read timeout (default: 3000)");
    println!("  --polls, -n N       Number of 1 Hz status polls (default: 5)");
    println!("  --toggle-bypass     Toggle the bypass relay between polls");
    println!("  --step DELTA        Issue one filter step (-10, -1, 1 or 10)");
    println!("  --help, -h          Show this help");
}
