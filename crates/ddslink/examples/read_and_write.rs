// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish squares and read them back through the same connector.

use ddslink::{Connector, ConnectorOptions, Result};

fn main() -> Result<()> {
    env_logger::init();

    let config = format!("str://{}", include_str!("shapes.xml"));
    let connector = Connector::new(
        "MyParticipantLibrary::Zero",
        &config,
        ConnectorOptions::default(),
    )?;

    let output = connector.get_output("MyPublisher::MySquareWriter")?;
    let input = connector.get_input("MySubscriber::MySquareReader")?;

    for i in 0..5 {
        output.set_string("color", "BLUE")?;
        output.set_number("x", f64::from(i * 10))?;
        output.set_number("y", f64::from(i * 20))?;
        output.set_number("shapesize", 30.0)?;
        output.write()?;

        connector.wait_for_data(5000)?;
        input.take()?;
        for index in 0..input.samples_len() {
            if input.info_boolean(index, "valid_data")? {
                println!("received: {}", input.json_sample(index)?);
            }
        }
    }

    Ok(())
}
