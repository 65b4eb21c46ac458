// SPDX-License-Identifier: MIT

use super::*;
use crate::spawn::test_support::InProcessSpawner;
use crate::spawn::WorkerSpawner;
use ics_wire::{ResultFrame, RunOutcome};
use std::path::Path;

fn spawn_link() -> WorkerLink {
    let spawned = InProcessSpawner.spawn(&[], Path::new("/tmp")).unwrap();
    WorkerLink::new(spawned)
}

#[tokio::test]
async fn compile_request_yields_progress_then_result() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("M.hs"), "module M where\nx = 1\n").unwrap();
    let link = spawn_link();

    let handle = link
        .send_compile(Request::Compile {
            dynamic_options: None,
            sources_dir: dir.path().to_path_buf(),
            generate_code: false,
            source_extensions: vec!["hs".to_string()],
        })
        .await
        .unwrap();

    let mut progress_count = 0;
    let result = handle
        .wait(|frame| {
            if matches!(frame, WorkerFrame::Progress(_)) {
                progress_count += 1;
            }
        })
        .await
        .unwrap();

    assert_eq!(progress_count, 1);
    match result {
        WorkerFrame::Result(ResultFrame::Computed(computed)) => {
            assert_eq!(computed.loaded_modules, vec!["M".to_string()]);
        }
        other => panic!("unexpected terminal frame: {other:?}"),
    }
}

#[tokio::test]
async fn run_request_streams_output_then_outcome() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("M.hs"), "module M where\nmain = hello\n").unwrap();
    let link = spawn_link();

    let compile = link
        .send_compile(Request::Compile {
            dynamic_options: None,
            sources_dir: dir.path().to_path_buf(),
            generate_code: false,
            source_extensions: vec!["hs".to_string()],
        })
        .await
        .unwrap();
    compile.wait(|_| {}).await.unwrap();

    let handle = link
        .send_run(Request::Run {
            module: "M".to_string(),
            identifier: "main".to_string(),
            env_overlay: Vec::new(),
        })
        .await
        .unwrap();

    let mut outputs = Vec::new();
    let result = handle
        .wait(|frame| {
            if let WorkerFrame::Progress(ics_wire::ProgressFrame::Output(bytes)) = frame {
                outputs.push(bytes.clone());
            }
        })
        .await
        .unwrap();

    assert_eq!(outputs, vec![b"hello\n".to_vec()]);
    assert!(matches!(result, WorkerFrame::Result(ResultFrame::Run(RunOutcome::Completed))));
}

#[tokio::test]
async fn ping_does_not_require_an_in_flight_request() {
    let link = spawn_link();
    link.ping().await.unwrap();
}

#[tokio::test]
async fn cancel_surfaces_as_cancelled_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("M.hs"), "module M where\nx = 1\n").unwrap();
    let link = spawn_link();

    let handle = link
        .send_compile(Request::Compile {
            dynamic_options: None,
            sources_dir: dir.path().to_path_buf(),
            generate_code: false,
            source_extensions: vec!["hs".to_string()],
        })
        .await
        .unwrap();

    handle.cancel();
    let err = handle.wait(|_| {}).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn canceller_works_after_the_handle_it_came_from_is_moved() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("M.hs"), "module M where\nx = 1\n").unwrap();
    let link = spawn_link();

    let handle = link
        .send_compile(Request::Compile {
            dynamic_options: None,
            sources_dir: dir.path().to_path_buf(),
            generate_code: false,
            source_extensions: vec!["hs".to_string()],
        })
        .await
        .unwrap();

    let canceller = handle.canceller();
    let wait_task = tokio::spawn(handle.wait(|_| {}));
    canceller.cancel();
    let err = wait_task.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
}
