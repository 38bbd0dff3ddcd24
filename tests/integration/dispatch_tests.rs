//! End-to-end dispatch: telemetry cadence, button actions, cloud callbacks.

use envhub::drivers::indicator::Color;
use envhub::state::BlinkConfig;

use crate::mock_hw::{fast_config, CloudDelivery, HwCall, MockCloud, Scenario};

fn presence_values(s: &Scenario) -> Vec<f64> {
    s.ctx
        .cloud
        .published
        .iter()
        .filter_map(|p| {
            let v: serde_json::Value = serde_json::from_str(p).unwrap();
            (v["data"]["type"] == "Presence").then(|| v["data"]["value"].as_f64().unwrap())
        })
        .collect()
}

#[test]
fn occupied_room_reports_presence_twice_per_tick() {
    let mut s = Scenario::new(fast_config(), MockCloud::connected(), None);
    s.light.borrow_mut().push_back(1800.0);
    s.stop_after_waits(4); // exactly one status tick

    s.run();

    assert_eq!(presence_values(&s), vec![1.0, 1.0]);
}

#[test]
fn empty_room_reports_presence_three_times_per_tick() {
    let mut s = Scenario::new(fast_config(), MockCloud::connected(), None);
    s.light.borrow_mut().push_back(600.0);
    s.stop_after_waits(4);

    s.run();

    assert_eq!(presence_values(&s), vec![0.0, 0.0, 0.0]);
}

#[test]
fn status_tick_renders_the_mirrors_and_clock() {
    let mut s = Scenario::new(fast_config(), MockCloud::default(), None);
    s.stop_after_waits(2);

    s.run();

    let frame = s.ctx.hw.frames.first().expect("one frame rendered");
    assert!((frame.temperature_c - 23.5).abs() < 0.01);
    assert!((frame.humidity_pct - 40.0).abs() < 0.01);
    assert_eq!(frame.clock.as_str(), "01-01 00:00:00");
    assert!(!frame.lamp_on);
    assert!(!frame.alarm_on);
}

#[test]
fn rate_button_cycles_interval_and_reports_when_connected() {
    let mut s = Scenario::new(fast_config(), MockCloud::connected(), None);
    // Polls at t=0.5, 1.0, 1.5; press on the third, once connectivity from
    // the t=1.0 service tick is in place.
    s.rate_pin.borrow_mut().extend([false, false, true]);
    s.stop_after_waits(4);

    s.run();

    assert_eq!(s.ctx.state.blink.interval_index, 1);
    assert!(s
        .ctx
        .cloud
        .reported
        .contains(&("LedBlinkRateProperty".to_string(), 1)));
}

#[test]
fn send_button_publishes_a_custom_marker() {
    let mut s = Scenario::new(fast_config(), MockCloud::connected(), None);
    s.send_pin.borrow_mut().extend([false, false, true]);
    s.stop_after_waits(4);

    s.run();

    assert_eq!(s.ctx.cloud.published_kinds().iter().filter(|k| *k == "Custom").count(), 1);
}

#[test]
fn desired_rate_index_is_clamped_applied_and_acknowledged() {
    let cloud = {
        let mut c = MockCloud::connected();
        c.deliveries.push_back(CloudDelivery::ConfigUpdate(5));
        c
    };
    let mut s = Scenario::new(fast_config(), cloud, None);
    s.stop_after_waits(2);

    s.run();

    assert_eq!(s.ctx.state.blink.interval_index, 2, "5 mod 3 = 2");
    assert!(s
        .ctx
        .cloud
        .reported
        .contains(&("LedBlinkRateProperty".to_string(), 2)));
}

#[test]
fn desired_rate_applies_locally_even_without_connectivity() {
    // Client exists (setup succeeds) but never reported the link up, so the
    // acknowledgment is dropped while the new interval still takes effect.
    let cloud = {
        let mut c = MockCloud {
            connect: true,
            ..MockCloud::default()
        };
        c.deliveries.push_back(CloudDelivery::ConfigUpdate(4));
        c
    };
    let mut s = Scenario::new(fast_config(), cloud, None);
    s.stop_after_waits(2);

    s.run();

    assert_eq!(s.ctx.state.blink.interval_index, 1);
    assert!(s.ctx.cloud.reported.is_empty());
}

#[test]
fn inbound_alarm_command_drives_relay_and_mirror() {
    let cloud = {
        let mut c = MockCloud::connected();
        c.deliveries.push_back(CloudDelivery::Message(
            r#"{"Data":{"type":"SetAlarm","value":1}}"#.to_string(),
        ));
        c
    };
    let mut s = Scenario::new(fast_config(), cloud, None);
    s.stop_after_waits(2);

    s.run();

    assert!(s.ctx.hw.calls.contains(&HwCall::Alarm(true)));
    assert!(s.ctx.state.flags.alarm_on);
}

#[test]
fn color_control_method_changes_the_blink_color() {
    let cloud = {
        let mut c = MockCloud::connected();
        c.deliveries.push_back(CloudDelivery::Method {
            name: "LedColorControlMethod".to_string(),
            payload: r#"{"color":"magenta"}"#.to_string(),
        });
        c
    };
    let mut s = Scenario::new(fast_config(), cloud, None);
    s.stop_after_waits(2);

    s.run();

    assert_eq!(s.ctx.state.blink.color, Color::Magenta);
    assert_eq!(s.ctx.cloud.method_responses[0].status, 200);
}

#[test]
fn unknown_method_gets_a_404_and_changes_nothing() {
    let cloud = {
        let mut c = MockCloud::connected();
        c.deliveries.push_back(CloudDelivery::Method {
            name: "RebootMethod".to_string(),
            payload: "{}".to_string(),
        });
        c
    };
    let mut s = Scenario::new(fast_config(), cloud, None);
    s.stop_after_waits(2);

    s.run();

    assert_eq!(s.ctx.state.blink.color, BlinkConfig::default().color);
    assert_eq!(s.ctx.cloud.method_responses[0].status, 404);
    assert!(s.ctx.cloud.method_responses[0].body.contains("RebootMethod"));
}

#[test]
fn lost_connectivity_gates_sends_again() {
    let cloud = {
        let mut c = MockCloud::connected();
        c.deliveries.push_back(CloudDelivery::Connectivity(false));
        c
    };
    let mut s = Scenario::new(fast_config(), cloud, None);
    s.light.borrow_mut().push_back(1800.0);
    s.stop_after_waits(4);

    s.run();

    // The same service tick that connected also reported the link down
    // again, before the status tick ran — nothing may be published.
    assert!(!s.ctx.state.connected);
    assert!(s.ctx.cloud.published.is_empty());
}
