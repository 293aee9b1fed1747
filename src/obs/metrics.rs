// self
use crate::obs::{FlowKind, FlowOutcome, PollOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_public_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records one device code poll via the global metrics recorder (when enabled).
pub fn record_poll_outcome(outcome: PollOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_public_client_device_code_poll_total",
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records the terminal state of one device code attempt (when enabled).
pub fn record_device_code_terminal(state: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("oauth2_public_client_device_code_terminal_total", "state" => state)
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = state;
	}
}
