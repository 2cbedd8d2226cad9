// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Block on data from a publisher running on another thread.

use ddslink::{Connector, ConnectorOptions, Result};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    let config = format!("str://{}", include_str!("shapes.xml"));
    let subscriber = Connector::new(
        "MyParticipantLibrary::Zero",
        &config,
        ConnectorOptions::default(),
    )?;
    let input = subscriber.get_input("MySubscriber::MySquareReader")?;

    let publisher = thread::spawn(move || -> Result<()> {
        let config = format!("str://{}", include_str!("shapes.xml"));
        let connector = Connector::new(
            "MyParticipantLibrary::Zero",
            &config,
            ConnectorOptions::default(),
        )?;
        let output = connector.get_output("MyPublisher::MySquareWriter")?;

        for i in 0..10 {
            output.set_string("color", "GREEN")?;
            output.set_number("x", f64::from(i))?;
            output.write()?;
            thread::sleep(Duration::from_millis(100));
        }
        Ok(())
    });

    let mut received = 0;
    while received < 10 {
        match input.wait_for_data(2000) {
            Ok(()) => {
                input.take()?;
                for index in 0..input.samples_len() {
                    let x = input.number_from_sample(index, "x")?;
                    println!("square at x={}", x);
                    received += 1;
                }
            }
            Err(e) if e.is_timeout() => {
                println!("no data within 2s, giving up");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    publisher.join().expect("publisher thread")?;
    Ok(())
}
