//! Metric helpers, all through the `metrics` facade. Without an
//! installed recorder these are no-ops, which is exactly what tests
//! want.

use metrics::{counter, gauge};

pub fn connection_accepted() {
    counter!("smppgw_connections_total").increment(1);
}

pub fn connection_rejected(reason: &str) {
    counter!("smppgw_connections_rejected_total", "reason" => reason.to_string()).increment(1);
}

pub fn sessions_active(count: usize) {
    gauge!("smppgw_sessions_active").set(count as f64);
}

pub fn pdu_received(command: &str) {
    counter!("smppgw_pdus_received_total", "command" => command.to_string()).increment(1);
}

pub fn pdu_sent(command: &str) {
    counter!("smppgw_pdus_sent_total", "command" => command.to_string()).increment(1);
}

pub fn pdu_decode_error() {
    counter!("smppgw_pdu_decode_errors_total").increment(1);
}

pub fn pdu_malformed(command: &str) {
    counter!("smppgw_pdus_malformed_total", "command" => command.to_string()).increment(1);
}

pub fn pdu_unknown_command() {
    counter!("smppgw_pdus_unknown_command_total").increment(1);
}

pub fn bind_accepted(bind_type: &str) {
    counter!("smppgw_binds_total", "bind_type" => bind_type.to_string(), "outcome" => "accepted")
        .increment(1);
}

pub fn bind_rejected(bind_type: &str) {
    counter!("smppgw_binds_total", "bind_type" => bind_type.to_string(), "outcome" => "rejected")
        .increment(1);
}

pub fn submit_accepted(system_id: &str) {
    counter!("smppgw_submits_total", "system_id" => system_id.to_string(), "outcome" => "accepted")
        .increment(1);
}

pub fn submit_throttled(system_id: &str) {
    counter!("smppgw_submits_total", "system_id" => system_id.to_string(), "outcome" => "throttled")
        .increment(1);
}

pub fn submit_publish_failed() {
    counter!("smppgw_submit_publish_failures_total").increment(1);
}

pub fn report_delivered(system_id: &str) {
    counter!("smppgw_reports_delivered_total", "system_id" => system_id.to_string()).increment(1);
}

pub fn report_dropped(reason: &str) {
    counter!("smppgw_reports_dropped_total", "reason" => reason.to_string()).increment(1);
}
