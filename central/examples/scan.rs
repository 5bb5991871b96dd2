// Copyright 2023 Google LLC
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

use std::error::Error;
use std::time::Duration;

use bluetooth::ServiceUuid;
use central::{Central, ScanResult};
use log::info;

const HEART_RATE: u16 = 0x180D;
const FAST_PAIR: u16 = 0xFE2C;

fn print_result(label: &'static str) -> impl FnMut(ScanResult) + Send {
    move |result| match result {
        ScanResult::Discovered(advertisement) => println!(
            "[{}] {} {} rssi={:?}",
            label,
            advertisement.address(),
            advertisement.local_name().unwrap_or("<unnamed>"),
            advertisement.rssi(),
        ),
        other => println!("[{}] done: {:?}", label, other),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let central = Central::shared().await?;
    info!("Radio is {}.", central.current_state());
    let state = central.state().await?;
    println!("Radio settled: {}", state);

    // Two overlapping scans share one discovery with the union filter.
    central.scan_with_timeout(
        Duration::from_secs(2),
        Some(vec![ServiceUuid::from_u16(HEART_RATE)]),
        print_result("heart rate"),
    )?;
    central.scan_with_timeout(
        Duration::from_secs(3),
        Some(vec![ServiceUuid::from_u16(FAST_PAIR)]),
        print_result("fast pair"),
    )?;

    // Everything else, collected through a channel and cut short.
    let mut everything = central.scan(Duration::from_secs(10), None)?;
    let mut seen = 0;
    while let Some(result) = everything.recv().await {
        if let ScanResult::Discovered(_) = result {
            seen += 1;
            if seen == 20 {
                central.stop_scan()?;
            }
        } else {
            println!("[all] done after {} advertisements: {:?}", seen, result);
        }
    }

    println!("Scanning: {}", central.is_scanning());
    Ok(())
}
