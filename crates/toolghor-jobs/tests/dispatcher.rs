// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end runs of every operation through the dispatcher.

mod common;

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{FakeVideo, Harness, jpeg, numbered_pdf, page_widths, pdf_file, png};
use toolghor_core::{ErrorClass, QueuedFile};
use toolghor_jobs::{Dispatcher, OperationId, RunOutcome};

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

// -- Validation --

#[tokio::test]
async fn empty_queue_create_zip_is_rejected_without_touching_progress() {
    let h = Harness::new(&[]);
    let outcome = h.dispatcher.run(OperationId::CreateZip).await;

    assert!(matches!(outcome, RunOutcome::Rejected(ref m) if m == "No files in queue"));
    assert_eq!(h.status(), (0, "No files in queue".to_string()));
    assert!(h.sink.artifacts().is_empty());
}

#[tokio::test]
async fn every_operation_reports_its_empty_message() {
    let h = Harness::new(&[]);
    // A queue with nothing any single-type tool accepts.
    h.enqueue(vec![QueuedFile::from_bytes("notes.txt", "text/plain", b"x".to_vec())]);
    h.queue.reporter().set(37, "previous");

    for descriptor in Dispatcher::operations() {
        if descriptor.id == OperationId::CreateZip {
            continue;
        }
        let outcome = h.dispatcher.run(descriptor.id).await;
        assert!(matches!(outcome, RunOutcome::Rejected(_)), "{}", descriptor.id);
        assert_eq!(h.status(), (37, descriptor.empty_message.to_string()));
    }
}

#[tokio::test]
async fn cancelled_or_bad_parameters_reject_before_processing() {
    let cases: [(OperationId, &[&str], &str); 8] = [
        (OperationId::RotatePdf, &[], "Invalid angle"),
        (OperationId::RotatePdf, &["45"], "Invalid angle"),
        (OperationId::DeletePages, &[""], "Invalid page list"),
        (OperationId::ReorderPages, &[], "Invalid page order"),
        (OperationId::ConvertImage, &["gif"], "Invalid format"),
        (OperationId::ConvertVideo, &["mkv"], "Invalid format"),
        (OperationId::TrimVideo, &["00:00:05"], "Invalid end time"),
        (OperationId::TrimVideo, &["00:20", "00:10"], "End time must be after start time"),
    ];

    for (id, answers, expected) in cases {
        let h = Harness::new(answers);
        h.enqueue(vec![
            pdf_file("a.pdf", numbered_pdf(2).await),
            QueuedFile::from_bytes("a.png", "image/png", png(2, 2)),
            QueuedFile::from_bytes("a.mp4", "video/mp4", b"clip".to_vec()),
        ]);
        let outcome = h.dispatcher.run(id).await;
        assert!(matches!(outcome, RunOutcome::Rejected(ref m) if m == expected), "{id}");
        assert_eq!(h.status().1, expected);
        assert!(h.sink.artifacts().is_empty());
        assert!(h.video.events().is_empty());
    }
}

// -- PDF tools --

#[tokio::test]
async fn images_to_pdf_produces_one_document() {
    let h = Harness::new(&[]);
    h.enqueue(vec![
        QueuedFile::from_bytes("a.png", "image/png", png(30, 20)),
        QueuedFile::from_bytes("b.jpg", "image/jpeg", jpeg(40, 10)),
    ]);

    let outcome = h.dispatcher.run(OperationId::ImagesToPdf).await;
    assert!(outcome.is_completed());
    assert_eq!(h.sink.names(), ["images.pdf"]);
    let (percent, message) = h.status();
    assert_eq!(percent, 100);
    assert!(message.contains("complete"));
    assert_eq!(page_widths(&h.artifact("images.pdf")), [30, 40]);
}

#[tokio::test]
async fn merge_keeps_queue_order() {
    let h = Harness::new(&[]);
    h.enqueue(vec![
        pdf_file("two.pdf", numbered_pdf(2).await),
        QueuedFile::from_bytes("skip.png", "image/png", png(1, 1)),
        pdf_file("one.pdf", numbered_pdf(1).await),
    ]);

    h.dispatcher.run(OperationId::MergePdfs).await;
    assert_eq!(h.status(), (100, "Merge complete".to_string()));
    assert_eq!(page_widths(&h.artifact("merged.pdf")), [10, 20, 10]);
}

#[tokio::test]
async fn delete_range_keeps_first_and_last_page() {
    let h = Harness::new(&["2-4"]);
    h.enqueue(vec![pdf_file("report.pdf", numbered_pdf(5).await)]);

    let outcome = h.dispatcher.run(OperationId::DeletePages).await;
    assert!(outcome.is_completed());
    assert_eq!(h.status(), (100, "Pages deleted".to_string()));
    assert_eq!(page_widths(&h.artifact("edited_report.pdf")), [10, 50]);
}

#[tokio::test]
async fn delete_ignores_pages_beyond_the_document() {
    let h = Harness::new(&["1,3,5"]);
    h.enqueue(vec![
        pdf_file("five.pdf", numbered_pdf(5).await),
        pdf_file("three.pdf", numbered_pdf(3).await),
    ]);

    h.dispatcher.run(OperationId::DeletePages).await;
    assert_eq!(page_widths(&h.artifact("edited_five.pdf")), [20, 40]);
    assert_eq!(page_widths(&h.artifact("edited_three.pdf")), [20]);
}

#[tokio::test]
async fn invalid_reorder_skips_only_that_file() {
    let h = Harness::new(&["3,1,2,4"]);
    h.enqueue(vec![
        pdf_file("short.pdf", numbered_pdf(3).await),
        pdf_file("four.pdf", numbered_pdf(4).await),
    ]);

    let outcome = h.dispatcher.run(OperationId::ReorderPages).await;
    let RunOutcome::Completed { artifacts, skipped } = outcome else {
        panic!("reorder should complete");
    };
    assert_eq!(artifacts, ["reordered_four.pdf"]);
    assert_eq!(skipped, ["short.pdf"]);
    assert_eq!(page_widths(&h.artifact("reordered_four.pdf")), [30, 10, 20, 40]);
    assert_eq!(h.status(), (100, "Pages reordered".to_string()));
}

#[tokio::test]
async fn duplicate_reorder_is_skipped() {
    let h = Harness::new(&["1,1,2"]);
    h.enqueue(vec![pdf_file("a.pdf", numbered_pdf(4).await)]);

    let RunOutcome::Completed { artifacts, skipped } = h.dispatcher.run(OperationId::ReorderPages).await
    else {
        panic!("reorder should complete");
    };
    assert!(artifacts.is_empty());
    assert_eq!(skipped, ["a.pdf"]);
    assert_eq!(h.status(), (100, "Invalid page order".to_string()));
}

#[tokio::test]
async fn out_of_range_reorder_keeps_the_skip_status() {
    let h = Harness::new(&["1,5"]);
    h.enqueue(vec![pdf_file("four.pdf", numbered_pdf(4).await)]);

    let outcome = h.dispatcher.run(OperationId::ReorderPages).await;
    assert!(outcome.skipped_everything());
    let RunOutcome::Completed { artifacts, skipped } = outcome else {
        panic!("reorder should complete");
    };
    assert!(artifacts.is_empty());
    assert_eq!(skipped, ["four.pdf"]);
    assert!(h.sink.names().is_empty());
    assert_eq!(h.status(), (100, "Invalid page order".to_string()));
}

#[tokio::test]
async fn rotate_failure_halts_remaining_files() {
    let h = Harness::new(&["180"]);
    h.enqueue(vec![
        pdf_file("good.pdf", numbered_pdf(1).await),
        pdf_file("bad.pdf", b"%PDF-1.7 truncated".to_vec()),
        pdf_file("never.pdf", numbered_pdf(1).await),
    ]);

    let outcome = h.dispatcher.run(OperationId::RotatePdf).await;
    let RunOutcome::Failed(err) = outcome else {
        panic!("rotation should fail");
    };
    assert_eq!(err.class(), ErrorClass::PerFileProcessing);
    assert_eq!(h.sink.names(), ["rotated_good.pdf"]);

    let (percent, message) = h.status();
    assert!(message.starts_with("Error: "), "{message}");
    // 10 + floor(1/3 * 90); not reset by the failure.
    assert_eq!(percent, 40);
}

#[tokio::test]
async fn pdf_to_images_accepts_pdf_suffix_and_nests_multiple_documents() {
    let h = Harness::new(&[]);
    h.enqueue(vec![
        pdf_file("scan.pdf", numbered_pdf(2).await),
        QueuedFile::from_bytes("scan.pdf", "", numbered_pdf(1).await),
    ]);

    h.dispatcher.run(OperationId::PdfToImages).await;
    assert_eq!(h.status(), (100, "Images saved".to_string()));
    assert_eq!(
        zip_names(&h.artifact("pdf_images.zip")),
        ["scan/page_1.png", "scan/page_2.png", "scan_2/page_1.png"]
    );
}

#[tokio::test]
async fn pdf_to_images_single_document_is_flat() {
    let h = Harness::new(&[]);
    h.enqueue(vec![pdf_file("invoice.pdf", numbered_pdf(2).await)]);

    h.dispatcher.run(OperationId::PdfToImages).await;
    let zip = h.artifact("pdf_images.zip");
    assert_eq!(zip_names(&zip), ["invoice_page_1.png", "invoice_page_2.png"]);

    let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
    let mut second = Vec::new();
    archive.by_index(1).unwrap().read_to_end(&mut second).unwrap();
    assert_eq!(image::load_from_memory(&second).unwrap().width(), 20);
}

// -- Image and text tools --

#[tokio::test]
async fn convert_image_names_by_target_extension() {
    let h = Harness::new(&["jpg"]);
    h.enqueue(vec![
        QueuedFile::from_bytes("photo.final.png", "image/png", png(5, 5)),
        QueuedFile::from_bytes("clip.mp4", "video/mp4", Vec::new()),
    ]);

    h.dispatcher.run(OperationId::ConvertImage).await;
    let artifacts = h.sink.artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "photo.final.jpg");
    assert_eq!(artifacts[0].mime_type, "image/jpeg");
    assert_eq!(
        image::guess_format(&artifacts[0].data).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn extract_text_lays_out_images_and_pdf_pages() {
    let h = Harness::new(&[]);
    h.enqueue(vec![
        QueuedFile::from_bytes("sign.png", "image/png", png(12, 7)),
        pdf_file("scan.pdf", numbered_pdf(2).await),
    ]);

    h.dispatcher.run(OperationId::ExtractText).await;
    assert_eq!(h.status(), (100, "Text extraction complete".to_string()));
    let text = String::from_utf8(h.artifact("extracted_text.txt")).unwrap();
    assert!(text.starts_with("--- sign.png ---\n12x7\n\n"), "{text}");
    assert!(text.contains("--- scan.pdf Page 1 ---\n"));
    assert!(text.contains("--- scan.pdf Page 2 ---\n"));
}

// -- Video tools --

#[tokio::test]
async fn convert_video_reports_each_file() {
    let h = Harness::new(&["webm"]);
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&statuses);
    h.queue
        .reporter()
        .on_progress(move |state| seen.lock().unwrap().push(state.message.clone()));

    h.enqueue(vec![
        QueuedFile::from_bytes("a.mov", "video/quicktime", b"A".to_vec()),
        QueuedFile::from_bytes("b.mp4", "video/mp4", b"B".to_vec()),
    ]);
    h.dispatcher.run(OperationId::ConvertVideo).await;

    assert_eq!(h.sink.names(), ["a.webm", "b.webm"]);
    assert_eq!(h.artifact("a.webm"), b"A|mov->webm");
    let statuses = statuses.lock().unwrap();
    assert!(statuses.contains(&"Initializing video converter...".to_string()));
    assert!(statuses.contains(&"Converting a.mov...".to_string()));
    assert!(statuses.contains(&"Converting b.mp4...".to_string()));
    assert_eq!(statuses.last().unwrap(), "Video conversion complete");
}

#[tokio::test]
async fn trim_video_passes_the_window() {
    let h = Harness::new(&["00:01:00", "01:30"]);
    h.enqueue(vec![QueuedFile::from_bytes("talk.mp4", "video/mp4", b"T".to_vec())]);

    h.dispatcher.run(OperationId::TrimVideo).await;
    assert_eq!(h.artifact("trimmed_talk.mp4"), b"T|mp4[60+30]");
    assert_eq!(h.sink.artifacts()[0].mime_type, "video/mp4");
    assert_eq!(h.status(), (100, "Video trimming complete".to_string()));
}

#[tokio::test]
async fn unavailable_video_engine_fails_the_run() {
    let h = Harness::build(&["mp4"], FakeVideo::new(false), false);
    h.enqueue(vec![QueuedFile::from_bytes("a.avi", "video/x-msvideo", b"A".to_vec())]);

    let RunOutcome::Failed(err) = h.dispatcher.run(OperationId::ConvertVideo).await else {
        panic!("run should fail");
    };
    assert_eq!(err.class(), ErrorClass::EnvironmentUnavailable);
    assert_eq!(h.status(), (5, "Error: ffmpeg unavailable: not installed".to_string()));
    assert!(h.video.events().is_empty());
}

// -- Archive tools --

#[tokio::test]
async fn zip_round_trip_through_the_queue() {
    let h = Harness::new(&[]);
    h.enqueue(vec![
        QueuedFile::from_bytes("a.txt", "text/plain", b"alpha".to_vec()),
        QueuedFile::from_bytes("b.png", "image/png", png(1, 1)),
    ]);
    h.dispatcher.run(OperationId::CreateZip).await;
    assert_eq!(h.status(), (100, "ZIP created".to_string()));
    let zip = h.artifact("archive.zip");
    assert_eq!(zip_names(&zip), ["a.txt", "b.png"]);

    h.sink.take();
    h.queue.clear();
    h.enqueue(vec![QueuedFile::from_bytes("archive.zip", "", zip)]);
    let RunOutcome::Completed { artifacts, .. } = h.dispatcher.run(OperationId::ExtractZip).await
    else {
        panic!("extraction should complete");
    };
    assert_eq!(artifacts, ["a.txt", "b.png"]);
    assert_eq!(h.artifact("a.txt"), b"alpha");
    assert_eq!(h.sink.artifacts()[1].mime_type, "image/png");
    assert_eq!(h.status(), (100, "ZIP extraction complete".to_string()));
}

#[tokio::test]
async fn corrupt_zip_fails_extraction() {
    let h = Harness::new(&[]);
    h.enqueue(vec![QueuedFile::from_bytes("bad.zip", "application/zip", b"nope".to_vec())]);

    let outcome = h.dispatcher.run(OperationId::ExtractZip).await;
    assert!(matches!(outcome, RunOutcome::Failed(_)));
    assert!(h.status().1.starts_with("Error: archive operation failed"));
}

// -- Progress and concurrency --

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_100() {
    let h = Harness::new(&[]);
    let percents = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&percents);
    h.queue
        .reporter()
        .on_progress(move |state| seen.lock().unwrap().push(state.percent));

    h.enqueue((0u8..7).map(|i| QueuedFile::from_bytes(format!("f{i}.bin"), "", vec![i])).collect());
    h.dispatcher.run(OperationId::CreateZip).await;

    let percents = percents.lock().unwrap();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(percents.first(), Some(&10));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn runs_snapshot_the_queue_when_they_start() {
    let video = FakeVideo::new(true).with_delay(Duration::from_millis(20));
    let h = Harness::build(&["mp4"], video, false);
    h.enqueue(vec![QueuedFile::from_bytes("a.mov", "video/quicktime", b"A".to_vec())]);

    let run = h.dispatcher.run(OperationId::ConvertVideo);
    let mutate = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        h.queue.clear();
        h.enqueue(vec![QueuedFile::from_bytes("late.mov", "video/quicktime", b"L".to_vec())]);
    };
    let (outcome, ()) = tokio::join!(run, mutate);

    assert!(outcome.is_completed());
    assert_eq!(h.sink.names(), ["a.mp4"]);
}

/// Concurrent runs share the status signal: whichever writes last wins.
#[tokio::test]
async fn concurrent_runs_interleave_on_the_shared_status() {
    let video = FakeVideo::new(true).with_delay(Duration::from_millis(10));
    let h = Harness::build(&["mp4", "00:00", "00:05"], video, false);
    h.enqueue(vec![QueuedFile::from_bytes("a.mp4", "video/mp4", b"A".to_vec())]);

    let (first, second) = tokio::join!(
        h.dispatcher.run(OperationId::ConvertVideo),
        h.dispatcher.run(OperationId::TrimVideo),
    );
    assert!(first.is_completed() && second.is_completed());
    assert_eq!(h.video.events(), ["start A", "start A", "end A", "end A"]);
    let message = h.status().1;
    assert!(message == "Video conversion complete" || message == "Video trimming complete");
}

#[tokio::test]
async fn exclusive_runs_do_not_overlap() {
    let video = FakeVideo::new(true).with_delay(Duration::from_millis(10));
    let h = Harness::build(&["mp4", "00:00", "00:05"], video, true);
    h.enqueue(vec![QueuedFile::from_bytes("a.mp4", "video/mp4", b"A".to_vec())]);

    let (first, second) = tokio::join!(
        h.dispatcher.run(OperationId::ConvertVideo),
        h.dispatcher.run(OperationId::TrimVideo),
    );
    assert!(first.is_completed() && second.is_completed());
    assert_eq!(h.video.events(), ["start A", "end A", "start A", "end A"]);
    assert_eq!(h.status(), (100, "Video trimming complete".to_string()));
}
