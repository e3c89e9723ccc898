// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::args::HotspotdArgs;
use crate::commands::{parse_line, ConsoleCommand};
use crate::config::HotspotConfig;
use crate::events::{Event, Events};
use crate::service::Service;
use clap::Parser;
use hotspot_common::system::hotspotd_temp_dir;
use hotspot_common::util::hotspot_logger;
use log::{error, info, warn};
use std::io::BufRead;
use std::sync::mpsc::Receiver;
use std::thread;

/// Local-only and tethered hotspot broker running on a simulated radio.
pub fn rust_main() -> anyhow::Result<()> {
    let args = HotspotdArgs::parse();
    hotspot_logger::init("hotspotd", args.verbose);
    run_hotspotd_with_args(args)
}

fn run_hotspotd_with_args(args: HotspotdArgs) -> anyhow::Result<()> {
    info!("{:#?}", args);
    match hotspotd_temp_dir() {
        Ok(path) => info!("hotspotd artifacts path: {path:?}"),
        Err(err) => warn!("no hotspotd temp directory: {err}"),
    }
    let config = HotspotConfig::load(&args)?;
    info!("{config:#?}");

    let events = Events::new();
    let events_rx = events
        .lock()
        .map_err(|_| anyhow::anyhow!("events lock poisoned"))?
        .subscribe();
    let service = Service::start(&config, events)?;
    spawn_console(service)?;
    main_loop(events_rx);
    Ok(())
}

/// Reads commands from stdin until `quit` or end of input.
fn spawn_console(mut service: Service) -> anyhow::Result<()> {
    thread::Builder::new().name("hotspotd_console".to_string()).spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    error!("console read failed: {err}");
                    break;
                }
            };
            match parse_line(&line) {
                Ok(Some(ConsoleCommand::Quit)) => {
                    println!("{}", service.execute(ConsoleCommand::Quit));
                    return;
                }
                Ok(Some(command)) => println!("{}", service.execute(command)),
                Ok(None) => {}
                Err(err) => println!("{}", err.render()),
            }
        }
        service.shut_down("console closed");
    })?;
    Ok(())
}

// loop until ShutDown event is received, then log and return.
fn main_loop(events_rx: Receiver<Event>) {
    for event in events_rx.iter() {
        match event {
            Event::ShutDown { reason } => {
                info!("hotspotd is shutdown: {reason}");
                return;
            }
            Event::TetheredStateChanged { interface_name, state } => {
                info!("tethering on {interface_name:?} is {state:?}")
            }
            Event::LocalOnlyStateChanged { .. } => {}
        }
    }
}
