//! Properties of the state machine, gain stage and chunk pipeline

mod common;

use common::*;
use proptest::prelude::*;

use mic_stream_controller::audio::{apply_gain, GainFactor};
use mic_stream_controller::controller::CaptureOutcome;
use mic_stream_controller::error::{CaptureError, SinkError};
use mic_stream_controller::session::Mode;
use mic_stream_controller::ui::ControlPoll;

#[derive(Debug, Clone)]
enum Step {
    Poll(ControlPoll),
    FailNextSend,
    Timeout,
    DeviceError,
}

fn arb_poll() -> impl Strategy<Value = ControlPoll> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(0usize..40),
    )
        .prop_map(|(mic_tab, record_tab, play_tab, start, stop, gain_position)| ControlPoll {
            mic_tab,
            record_tab,
            play_tab,
            start,
            stop,
            gain_position,
        })
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => arb_poll().prop_map(Step::Poll),
        1 => Just(Step::FailNextSend),
        1 => Just(Step::Timeout),
        1 => Just(Step::DeviceError),
    ]
}

fn reference_gain(sample: i16, factor: u8) -> i16 {
    (sample as i32 * factor as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

proptest! {
    #[test]
    fn prop_at_most_one_session(steps in proptest::collection::vec(arb_step(), 1..60)) {
        let mut controller = controller_with(RecordingSink::starting_at(1), 10);

        for step in steps {
            let before = controller.active_session();
            let mode_before = controller.mode();
            let opens_before = controller.sink().opens.len();

            let poll = match step {
                Step::Poll(poll) => {
                    controller.capture_mut().push_full(1);
                    poll
                }
                Step::FailNextSend => {
                    controller.capture_mut().push_full(1);
                    controller.sink_mut().fail_next_chunk =
                        Some(SinkError::Rejected("busy".into()));
                    ControlPoll::default()
                }
                // No new block; may time out
                Step::Timeout => ControlPoll::default(),
                Step::DeviceError => {
                    controller
                        .capture_mut()
                        .push_error(CaptureError::Device("overrun".into()));
                    ControlPoll::default()
                }
            };
            let (start, stop) = (poll.start, poll.stop);
            controller.surface_mut().push(poll);

            let report = controller.tick().unwrap();
            let opens_after = controller.sink().opens.len();

            if before.is_some() {
                // Start is idempotent and the mode stays locked
                prop_assert_eq!(opens_after, opens_before);
                prop_assert_eq!(controller.mode(), mode_before);
                prop_assert_eq!(report.opened, None);
                if !stop {
                    prop_assert_eq!(controller.active_session(), before);
                }
            } else {
                prop_assert!(opens_after <= opens_before + 1);
            }

            if let Some(id) = report.opened {
                prop_assert!(start);
                prop_assert!(matches!(controller.mode(), Mode::MicMonitor | Mode::Record));
                if !stop {
                    prop_assert_eq!(controller.active_session(), Some(id));
                }
            }
            if controller.active_session().is_none() {
                prop_assert!(matches!(report.capture, CaptureOutcome::Idle));
            }
        }
    }

    #[test]
    fn prop_gain_matches_saturating_reference(
        samples in proptest::collection::vec(any::<i16>(), 0..512),
        factor in 1u8..=20,
    ) {
        let mut amplified = samples.clone();
        apply_gain(&mut amplified, GainFactor::clamped(factor as i32));

        prop_assert_eq!(amplified.len(), samples.len());
        for (out, input) in amplified.iter().zip(&samples) {
            prop_assert_eq!(*out, reference_gain(*input, factor));
        }
    }

    #[test]
    fn prop_meter_position_lights_position_plus_one(position in 0usize..10_000) {
        let gain = GainFactor::from_meter_position(position);
        prop_assert_eq!(gain.get() as usize, (position + 1).clamp(1, 20));
    }

    #[test]
    fn prop_clamped_gain_stays_in_range(value in any::<i32>()) {
        let gain = GainFactor::clamped(value).get();
        prop_assert!((1..=20).contains(&gain));
    }

    #[test]
    fn prop_chunks_arrive_in_capture_order(outcomes in proptest::collection::vec(0u8..5, 1..80)) {
        let mut controller = controller_with(RecordingSink::starting_at(7), 1);
        controller.surface_mut().push(together(&[mic(), start()]));

        let mut delivered = Vec::new();
        for (i, outcome) in outcomes.iter().enumerate() {
            let tag = i as i16;
            match outcome {
                // Delivered
                0 | 1 => {
                    controller.capture_mut().push_full(tag);
                    delivered.push(tag);
                }
                // Capture timed out
                2 => {}
                // Device error
                3 => controller
                    .capture_mut()
                    .push_error(CaptureError::Device("overrun".into())),
                // Captured but rejected by the sink
                _ => {
                    controller.capture_mut().push_full(tag);
                    controller.sink_mut().fail_next_chunk =
                        Some(SinkError::Rejected("busy".into()));
                }
            }
            controller.tick().unwrap();
        }

        let sink = controller.sink();
        let tags: Vec<i16> = sink.chunks.iter().map(|c| c.samples[0]).collect();
        prop_assert_eq!(tags, delivered);
        prop_assert!(sink.chunks.windows(2).all(|w| w[0].sequence < w[1].sequence));
        prop_assert!(sink.chunk_sessions().iter().all(|id| *id == 7));
    }
}
