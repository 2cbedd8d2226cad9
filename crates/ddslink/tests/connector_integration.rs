// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end connector behavior over the loopback core.
//!
//! Each test uses its own domain id so tests running in parallel on the
//! shared core never observe each other's entities.

use ddslink::{Connector, ConnectorOptions, Error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shapes-style configuration: one local participant with a writer/reader
/// pair and one remote participant with a second writer on the same topic.
fn config_source(domain_id: u32) -> String {
    format!(
        r#"str://<dds>
  <types>
    <struct name="Point">
      <member name="x" type="long"/>
      <member name="y" type="long"/>
    </struct>
    <struct name="ShapeType">
      <member name="color" type="string" stringMaxLength="128"/>
      <member name="position" type="nonBasic" nonBasicTypeName="Point"/>
      <member name="size" type="double"/>
      <member name="filled" type="boolean"/>
    </struct>
  </types>
  <domain_library name="ShapesDomainLib">
    <domain name="ShapesDomain" domain_id="{domain_id}">
      <register_type name="ShapeType" type_ref="ShapeType"/>
      <topic name="Square" register_type_ref="ShapeType"/>
    </domain>
  </domain_library>
  <domain_participant_library name="ShapesLib">
    <domain_participant name="Zero" domain_ref="ShapesDomainLib::ShapesDomain">
      <publisher name="MyPublisher">
        <data_writer name="MyWriter" topic_ref="Square"/>
      </publisher>
      <subscriber name="MySubscriber">
        <data_reader name="MyReader" topic_ref="Square"/>
      </subscriber>
    </domain_participant>
    <domain_participant name="Remote" domain_ref="ShapesDomainLib::ShapesDomain">
      <publisher name="RemotePub">
        <data_writer name="RemoteWriter" topic_ref="Square"/>
      </publisher>
    </domain_participant>
  </domain_participant_library>
</dds>"#
    )
}

fn connector(domain_id: u32, participant: &str, options: ConnectorOptions) -> Connector {
    Connector::new(
        &format!("ShapesLib::{}", participant),
        &config_source(domain_id),
        options,
    )
    .expect("connector creation")
}

#[test]
fn scenario_one_based_indexing() {
    let conn = connector(
        101,
        "Zero",
        ConnectorOptions {
            one_based_sequence_indexing: true,
            ..ConnectorOptions::default()
        },
    );

    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    output.set_number("size", 42.0).expect("set size");
    output.write().expect("write");

    conn.wait_for_data(5000).expect("wait_for_data");

    let input = conn.get_input("MySubscriber::MyReader").expect("input");
    input.take().expect("take");
    assert_eq!(input.samples_len(), 1);

    // Index origin is 1: the first sample is at index 1, and both 0 and 2
    // are out of range.
    assert_eq!(input.number_from_sample(1, "size").expect("size"), 42.0);
    assert!(matches!(
        input.number_from_sample(0, "size"),
        Err(Error::IndexOutOfRange { index: 0, len: 1 })
    ));
    assert!(matches!(
        input.number_from_sample(2, "size"),
        Err(Error::IndexOutOfRange { index: 2, len: 1 })
    ));
}

#[test]
fn take_drains_the_queue() {
    let conn = connector(102, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    for i in 0..3 {
        output.set_number("size", f64::from(i)).expect("set");
        output.write().expect("write");
    }

    input.take().expect("take");
    assert_eq!(input.samples_len(), 3);

    // No new publications in between: the queue is empty now.
    input.take().expect("second take");
    assert_eq!(input.samples_len(), 0);
}

#[test]
fn read_is_idempotent() {
    let conn = connector(103, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    output.set_string("color", "RED").expect("set color");
    output.set_number("position.x", 7.0).expect("set x");
    output.write().expect("write");
    output.set_string("color", "BLUE").expect("set color");
    output.write().expect("write");

    input.read().expect("first read");
    assert_eq!(input.samples_len(), 2);
    let first = input.json_sample(0).expect("json");

    input.read().expect("second read");
    assert_eq!(input.samples_len(), 2);
    assert_eq!(input.json_sample(0).expect("json"), first);
    assert_eq!(input.string_from_sample(1, "color").expect("color"), "BLUE");

    // A take after the reads still sees both samples, then drains them.
    input.take().expect("take");
    assert_eq!(input.samples_len(), 2);
    input.take().expect("take again");
    assert_eq!(input.samples_len(), 0);
}

#[test]
fn json_instance_round_trip() {
    let conn = connector(104, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");

    let doc = serde_json::json!({
        "color": "YELLOW",
        "position": {"x": 3, "y": -4},
        "filled": true
    });
    output
        .set_json_instance(&doc.to_string())
        .expect("set_json_instance");

    let round: serde_json::Value =
        serde_json::from_str(&output.json_instance().expect("json_instance")).expect("parse");

    // Every field of the document survives the round trip unchanged.
    for (key, expected) in doc.as_object().expect("object") {
        assert_eq!(round.get(key), Some(expected), "field '{}'", key);
    }

    // Unknown fields are rejected, not dropped.
    assert!(matches!(
        output.set_json_instance(r#"{"rotation": 45}"#),
        Err(Error::SchemaMismatch(_))
    ));
}

#[test]
fn clear_isolates_writes() {
    let conn = connector(105, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    output.set_string("color", "PURPLE").expect("set color");
    output.set_number("position.y", 9.0).expect("set y");
    output.set_boolean("filled", true).expect("set filled");

    output.clear().expect("clear");
    output.write().expect("write");

    input.take().expect("take");
    assert_eq!(input.samples_len(), 1);
    assert_eq!(input.string_from_sample(0, "color").expect("color"), "");
    assert_eq!(input.number_from_sample(0, "position.y").expect("y"), 0.0);
    assert!(!input.boolean_from_sample(0, "filled").expect("filled"));
}

#[test]
fn clear_member_resets_one_field() {
    let conn = connector(112, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    output.set_string("color", "ORANGE").expect("set color");
    output.set_number("size", 5.0).expect("set size");
    output.clear_member("color").expect("clear_member");
    output.write().expect("write");

    input.take().expect("take");
    assert_eq!(input.string_from_sample(0, "color").expect("color"), "");
    assert_eq!(input.number_from_sample(0, "size").expect("size"), 5.0);
}

#[test]
fn wait_times_out_within_bound() {
    let conn = connector(106, "Zero", ConnectorOptions::default());

    let start = Instant::now();
    let result = conn.wait_for_data(300);
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(Error::Timeout)));
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(1500));

    // A timeout is a normal outcome and does not disturb the error slot.
    assert_eq!(conn.last_error_message(), None);
}

#[test]
fn match_delta_signs() {
    let conn = connector(107, "Zero", ConnectorOptions::default());
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    // The local writer matched at construction time.
    assert_eq!(
        input.wait_for_matched_publication(2000).expect("initial"),
        1
    );

    let remote = connector(107, "Remote", ConnectorOptions::default());
    assert_eq!(input.wait_for_matched_publication(2000).expect("join"), 1);

    let peers = input.matched_publications().expect("peers");
    assert!(peers.contains("RemotePub::RemoteWriter"), "peers: {}", peers);

    drop(remote);
    assert_eq!(input.wait_for_matched_publication(2000).expect("leave"), -1);
}

#[test]
fn writer_side_matching_and_acks() {
    let conn = connector(108, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");

    assert_eq!(
        output.wait_for_matched_subscription(2000).expect("match"),
        1
    );
    let peers = output.matched_subscriptions().expect("peers");
    assert!(peers.contains("MySubscriber::MyReader"), "peers: {}", peers);

    output.set_number("size", 1.0).expect("set");
    output.write().expect("write");
    output
        .wait_for_acknowledgments(2000)
        .expect("acknowledgments");
}

#[test]
fn close_cancels_blocked_waits() {
    let conn = Arc::new(connector(109, "Zero", ConnectorOptions::default()));

    let waiter = Arc::clone(&conn);
    let handle = thread::spawn(move || waiter.wait_for_data(ddslink::TIMEOUT_INFINITE));

    thread::sleep(Duration::from_millis(50));
    conn.close();

    let result = handle.join().expect("waiter thread");
    assert!(matches!(result, Err(Error::ConnectorClosed)));

    // Operations after close fail with the same error.
    assert!(matches!(
        conn.get_input("MySubscriber::MyReader"),
        Err(Error::ConnectorClosed)
    ));
}

#[test]
fn wait_on_one_input_wakes_on_delivery() {
    let conn = Arc::new(connector(110, "Zero", ConnectorOptions::default()));
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    let publisher = Arc::clone(&conn);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let output = publisher.get_output("MyPublisher::MyWriter").expect("output");
        output.set_number("size", 3.0).expect("set");
        output.write().expect("write");
    });

    input.wait_for_data(5000).expect("wait_for_data");
    input.take().expect("take");
    assert_eq!(input.samples_len(), 1);
    handle.join().expect("publisher thread");
}

#[test]
fn registry_is_idempotent_and_validates_names() {
    let conn = connector(111, "Zero", ConnectorOptions::default());

    let first = conn.get_input("MySubscriber::MyReader").expect("input");
    let second = conn.get_input("MySubscriber::MyReader").expect("input again");
    assert!(Arc::ptr_eq(&first, &second));

    assert!(matches!(
        conn.get_output("MyPublisher::Nope"),
        Err(Error::EntityNotFound(_))
    ));
    assert!(matches!(
        conn.get_output("MySubscriber::MyReader"),
        Err(Error::TypeMismatch(_))
    ));
    assert!(matches!(
        conn.get_input("MyPublisher::MyWriter"),
        Err(Error::TypeMismatch(_))
    ));

    let message = conn.last_error_message().expect("recorded");
    assert!(message.contains("MyPublisher::MyWriter"), "{}", message);
}

#[test]
fn sample_info_and_lifecycle_events() {
    let conn = connector(113, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    output.set_number("size", 8.0).expect("set");
    output.write().expect("write");
    output
        .write_with_params(r#"{"action": "dispose"}"#)
        .expect("dispose");

    input.take().expect("take");
    assert_eq!(input.samples_len(), 2);

    assert!(input.info_boolean(0, "valid_data").expect("valid_data"));
    assert!(input.info_boolean(0, "new_instance").expect("new_instance"));
    assert!(!input.info_boolean(1, "valid_data").expect("lifecycle sample"));

    let ts: i64 = input
        .info_json(0, "source_timestamp")
        .expect("timestamp")
        .parse()
        .expect("integer timestamp");
    assert!(ts > 0);

    let identity: ddslink::WriterIdentity =
        serde_json::from_str(&input.info_json(0, "identity").expect("identity"))
            .expect("identity JSON");
    assert_eq!(identity.sequence_number, 1);

    assert!(matches!(
        input.info_boolean(0, "no_such_field"),
        Err(Error::MemberNotFound(_))
    ));
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Shape {
    color: String,
    size: f64,
    filled: bool,
}

#[test]
fn serde_round_trip_through_samples() {
    let conn = connector(114, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    let shape = Shape {
        color: "CYAN".to_string(),
        size: 12.5,
        filled: true,
    };
    output.set_serialized(&shape).expect("set_serialized");
    output.write().expect("write");

    input.take().expect("take");
    let received: Shape = input.sample_as(0).expect("sample_as");
    assert_eq!(received, shape);

    let member = input.json_member(0, "position").expect("json_member");
    let position: serde_json::Value = serde_json::from_str(&member).expect("parse");
    assert_eq!(position, serde_json::json!({"x": 0, "y": 0}));
}

#[test]
fn disabled_data_events_leave_waits_to_time_out() {
    let local = connector(
        115,
        "Zero",
        ConnectorOptions {
            enable_on_data_event: false,
            ..ConnectorOptions::default()
        },
    );
    let input = local.get_input("MySubscriber::MyReader").expect("input");

    let remote = connector(115, "Remote", ConnectorOptions::default());
    let output = remote.get_output("RemotePub::RemoteWriter").expect("output");

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        output.set_number("size", 1.0).expect("set");
        output.write().expect("write");
    });

    // Data arrives mid-wait but the arrival no longer wakes the gate.
    let result = input.wait_for_data(300);
    assert!(matches!(result, Err(Error::Timeout)));
    handle.join().expect("publisher thread");

    // The samples are still there for a plain read.
    input.read().expect("read");
    assert_eq!(input.samples_len(), 1);
}

#[test]
fn raw_sample_view_is_borrow_scoped() {
    let conn = connector(118, "Zero", ConnectorOptions::default());
    let output = conn.get_output("MyPublisher::MyWriter").expect("output");
    let input = conn.get_input("MySubscriber::MyReader").expect("input");

    output.set_string("color", "WHITE").expect("set");
    output.write().expect("write");
    input.take().expect("take");

    {
        let view = input.sample(0).expect("view");
        assert_eq!(
            view.value()
                .get_field("color")
                .and_then(|v| v.as_str().map(str::to_string)),
            Some("WHITE".to_string())
        );
        assert!(view.info().valid_data);
    }

    // The view is gone; buffer operations proceed normally.
    input.take().expect("take after view");
    assert!(matches!(
        input.sample(5),
        Err(Error::IndexOutOfRange { .. })
    ));
}

#[test]
fn max_objects_tunable_is_locked_after_creation() {
    let _conn = connector(116, "Zero", ConnectorOptions::default());
    assert!(matches!(
        ddslink::set_max_objects_per_thread(4096),
        Err(Error::Config(_))
    ));
}

#[test]
fn unknown_participant_selector_fails() {
    let result = Connector::new(
        "ShapesLib::Missing",
        &config_source(117),
        ConnectorOptions::default(),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
