// SPDX-License-Identifier: MIT

use super::*;
use ics_core::SourceSpan;
use tokio::io::duplex;

#[tokio::test]
async fn request_round_trips_over_duplex_stream() {
    let (mut client, mut worker) = duplex(4096);

    let request = Request::Compile {
        dynamic_options: Some(vec!["-Wall".to_string()]),
        sources_dir: PathBuf::from("/src"),
        generate_code: false,
        source_extensions: vec!["hs".to_string()],
    };
    write_request(&mut client, &request).await.unwrap();

    match read_client_frame(&mut worker).await.unwrap() {
        ClientFrame::Request(Request::Compile { dynamic_options, generate_code, .. }) => {
            assert_eq!(dynamic_options, Some(vec!["-Wall".to_string()]));
            assert!(!generate_code);
        }
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn progress_then_result_is_the_observed_order() {
    let (mut worker_out, mut client_in) = duplex(4096);

    write_progress(&mut worker_out, &ProgressFrame::Compiling(Progress::start("compiling M")))
        .await
        .unwrap();
    write_progress(
        &mut worker_out,
        &ProgressFrame::Compiling(Progress::start("compiling M").advance("compiling N")),
    )
    .await
    .unwrap();
    write_result(
        &mut worker_out,
        &ResultFrame::Computed(ics_core::ComputedResult::default()),
    )
    .await
    .unwrap();

    let mut steps = Vec::new();
    loop {
        match read_worker_frame(&mut client_in).await.unwrap() {
            WorkerFrame::Progress(ProgressFrame::Compiling(p)) => steps.push(p.step),
            WorkerFrame::Result(ResultFrame::Computed(_)) => break,
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    assert_eq!(steps, vec![1, 2]);
    assert!(steps.windows(2).all(|w| w[1] >= w[0]));
}

#[tokio::test]
async fn shutdown_tag_round_trips_either_direction() {
    let (mut a, mut b) = duplex(1024);
    write_shutdown(&mut a).await.unwrap();
    assert!(matches!(read_client_frame(&mut b).await.unwrap(), ClientFrame::Shutdown));

    let (mut c, mut d) = duplex(1024);
    write_shutdown(&mut c).await.unwrap();
    assert!(matches!(read_worker_frame(&mut d).await.unwrap(), WorkerFrame::ShutdownAck));
}

#[tokio::test]
async fn ping_from_client_and_pong_from_worker_use_distinct_readers() {
    let (mut a, mut b) = duplex(1024);
    write_ping(&mut a).await.unwrap();
    assert!(matches!(read_client_frame(&mut b).await.unwrap(), ClientFrame::Ping));

    let (mut c, mut d) = duplex(1024);
    write_ping(&mut c).await.unwrap();
    assert!(matches!(read_worker_frame(&mut d).await.unwrap(), WorkerFrame::Pong));
}

#[tokio::test]
async fn unknown_tag_byte_is_decode_error() {
    let (mut a, mut b) = duplex(1024);
    write_message(&mut a, &[0xff]).await.unwrap();
    let err = read_client_frame(&mut b).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}

#[tokio::test]
async fn run_result_carries_typed_outcome() {
    let (mut a, mut b) = duplex(1024);
    write_result(
        &mut a,
        &ResultFrame::Run(RunOutcome::Exception { message: "boom".to_string() }),
    )
    .await
    .unwrap();
    match read_worker_frame(&mut b).await.unwrap() {
        WorkerFrame::Result(ResultFrame::Run(RunOutcome::Exception { message })) => {
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[test]
fn source_span_survives_json_in_span_info() {
    // Sanity check that ics-core types embed cleanly in wire payloads.
    let span = SourceSpan::new(1, 1, 2, 3);
    let json = serde_json::to_string(&span).unwrap();
    let back: SourceSpan = serde_json::from_str(&json).unwrap();
    assert_eq!(span, back);
}
