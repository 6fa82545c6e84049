use csv_partitioner::testing::{files_in, numbered_table, read_archive, table_to_csv, write_fixture};
use csv_partitioner::workspace::FileRemover;
use csv_partitioner::{Encoding, ExecMode, Runner, SplitError, SplitterConfig, Workspace};
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

fn runner(root: &Path, mode: ExecMode) -> anyhow::Result<Runner> {
    let config = SplitterConfig {
        workspace_root: root.join("work"),
        mode,
        ..Default::default()
    };
    Ok(Runner::new(config)?)
}

fn rows(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn splits_250_rows_into_three_balanced_files() -> anyhow::Result<()> {
    for mode in [ExecMode::Sequential, ExecMode::Parallel { threads: Some(4) }] {
        let tmp = tempfile::tempdir()?;
        let table = numbered_table(250, &["id", "name"]);
        let input = write_fixture(tmp.path(), "input.csv", table_to_csv(&table).as_bytes())?;
        let delivered = tmp.path().join("delivered.zip");

        let runner = runner(tmp.path(), mode)?;
        let outcome = runner.run(&input, rows(100), |archive| {
            assert_eq!(archive.path.file_name().unwrap(), "particoes.zip");
            fs::copy(&archive.path, &delivered)
        })?;

        assert_eq!(outcome.summary.partition_sizes, [84, 83, 83]);
        assert_eq!(outcome.summary.total_rows, 250);
        assert_eq!(outcome.summary.encoding, Encoding::Utf8);
        assert_eq!(outcome.summary.base_name, "input");
        assert!(outcome.teardown.is_clean());
        assert!(outcome.delivered > 0);

        let entries = read_archive(&delivered)?;
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["input_parte_1.csv", "input_parte_2.csv", "input_parte_3.csv"]);
        assert!(entries[0].1.starts_with("id,name\nid-0,name-0\n"));
        assert!(entries[2].1.ends_with("id-249,name-249\n"));

        assert!(files_in(runner.workspace().scratch_dir()).is_empty());
        assert!(files_in(runner.workspace().intake_dir()).is_empty());
        assert!(input.exists(), "the caller's file is never touched");
    }
    Ok(())
}

#[test]
fn decode_failure_returns_error_and_cleans_up() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = SplitterConfig {
        workspace_root: tmp.path().join("work"),
        fallback_encoding: Encoding::Windows1252,
        ..Default::default()
    };
    let runner = Runner::new(config)?;
    let input = write_fixture(tmp.path(), "broken.csv", b"a\n\x8D\n")?;

    let mut delivered = false;
    let err = runner
        .run(&input, rows(10), |_| {
            delivered = true;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, SplitError::Decode { .. }), "{err}");
    assert!(err.user_message().contains("decode"));
    assert!(!delivered);
    assert!(files_in(tmp.path().join("work")).is_empty());
    Ok(())
}

#[test]
fn latin1_upload_is_accepted() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = write_fixture(tmp.path(), "vendas.csv", b"produto,pre\xE7o\nma\xE7\xE3,3\n")?;
    let delivered = tmp.path().join("out.zip");

    let outcome = runner(tmp.path(), ExecMode::Sequential)?
        .run(&input, rows(1), |a| fs::copy(&a.path, &delivered))?;
    assert_eq!(outcome.summary.encoding, Encoding::Latin1);

    let entries = read_archive(&delivered)?;
    assert_eq!(entries, [("vendas_parte_1.csv".to_string(), "produto,preço\nmaçã,3\n".to_string())]);
    Ok(())
}

#[test]
fn failed_delivery_still_tears_down() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = write_fixture(tmp.path(), "data.csv", b"a\n1\n2\n")?;
    let runner = runner(tmp.path(), ExecMode::Sequential)?;

    let err = runner
        .run(&input, rows(1), |_| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        })
        .unwrap_err();
    assert!(matches!(err, SplitError::Delivery { .. }), "{err}");
    assert!(!err.is_user_facing());
    assert!(files_in(runner.workspace().intake_dir()).is_empty());
    assert!(files_in(runner.workspace().scratch_dir()).is_empty());
    Ok(())
}

struct DenyArchiveRemoval;

impl FileRemover for DenyArchiveRemoval {
    fn remove(&self, path: &Path) -> io::Result<()> {
        if path.extension().is_some_and(|e| e == "zip") {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"));
        }
        fs::remove_file(path)
    }
}

#[test]
fn cleanup_failure_does_not_fail_the_request() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = write_fixture(tmp.path(), "data.csv", b"a\n1\n2\n3\n")?;
    let runner = runner(tmp.path(), ExecMode::Sequential)?;

    let outcome = runner.run_with_remover(&input, rows(2), Box::new(DenyArchiveRemoval), |a| {
        Ok(a.entries.clone())
    })?;
    assert_eq!(outcome.delivered, ["data_parte_1.csv", "data_parte_2.csv"]);
    assert_eq!(outcome.teardown.failed.len(), 1);
    assert!(files_in(runner.workspace().scratch_dir()).is_empty());
    assert_eq!(
        files_in(runner.workspace().intake_dir()),
        [runner.workspace().intake_dir().join("particoes.zip")]
    );
    Ok(())
}

#[test]
fn empty_input_yields_single_header_only_entry() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = write_fixture(tmp.path(), "blank.csv", b"x,y\n")?;
    let delivered = tmp.path().join("out.zip");

    let outcome = runner(tmp.path(), ExecMode::default())?
        .run(&input, rows(100), |a| fs::copy(&a.path, &delivered))?;
    assert_eq!(outcome.summary.partition_sizes, [0]);
    assert_eq!(read_archive(&delivered)?, [("blank_parte_1.csv".to_string(), "x,y\n".to_string())]);
    Ok(())
}

#[test]
fn stale_files_from_a_previous_crash_are_swept() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let ws = Workspace::new(tmp.path().join("work"));
    ws.ensure_dirs()?;
    write_fixture(ws.scratch_dir(), "old_parte_9.csv", b"stale")?;

    let input = write_fixture(tmp.path(), "new.csv", b"a\n1\n")?;
    let runner = runner(tmp.path(), ExecMode::Sequential)?;
    let outcome = runner.run(&input, rows(5), |a| Ok(a.entries.clone()))?;

    assert_eq!(outcome.delivered, ["new_parte_1.csv"]);
    assert!(files_in(ws.scratch_dir()).is_empty());
    Ok(())
}

#[test]
fn input_already_in_intake_keeps_every_row() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let runner = runner(tmp.path(), ExecMode::Sequential)?;
    let intake = runner.workspace().intake_dir().to_path_buf();
    write_fixture(&intake, "data.csv", b"a\n1\n2\n3\n")?;

    let input = intake.join("..").join("uploads").join("data.csv");
    let outcome = runner.run(&input, rows(2), |a| Ok(a.entries.clone()))?;
    assert_eq!(outcome.summary.total_rows, 3);
    assert_eq!(outcome.summary.partition_sizes, [2, 1]);
    assert_eq!(outcome.delivered, ["data_parte_1.csv", "data_parte_2.csv"]);
    Ok(())
}
