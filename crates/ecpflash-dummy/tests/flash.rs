//! End-to-end tests driving the full stack against the emulated TAP.

use ecpflash_core::{Ecp5, Error, Flash, NoProgress, ProgressSink, Status};
use ecpflash_dummy::{DummyConfig, DummyEcp5};

fn open(device: DummyEcp5) -> Flash<DummyEcp5> {
    Ecp5::new(device, 1000).into_flash().unwrap()
}

#[derive(Default)]
struct RecordingSink(Vec<(usize, usize, Option<String>)>);

impl ProgressSink for RecordingSink {
    fn report(&mut self, done: usize, total: usize, status: Option<&str>) {
        self.0.push((done, total, status.map(str::to_owned)));
    }
}

#[test]
fn passthrough_entry_sequence() {
    let device = open(DummyEcp5::new_default()).release();
    assert_eq!(
        device.ir_log(),
        &[0xE0, 0x1C, 0xC6, 0x0E, 0x26, 0xFF, 0x3A]
    );
    assert!(device.passthrough());
    // 10 + 200 + 10 + 20 + 20 ms of settling at 1000 kHz.
    assert_eq!(device.idle_cycles(), 260_000);
}

#[test]
fn sessions_survive_release_and_reopen() {
    let pattern: Vec<u8> = (0..64u32).map(|i| i as u8).collect();
    let device = DummyEcp5::new_default().with_data(0x100, &pattern);

    let mut flash = open(device);
    assert_eq!(
        flash.read(0x100, 64, None, &mut NoProgress).unwrap(),
        pattern
    );

    // A second entry sequence on the same device must re-arm the
    // passthrough cleanly and leave transactions framed correctly.
    let mut flash = open(flash.release());
    assert_eq!(
        flash.read(0x100, 64, None, &mut NoProgress).unwrap(),
        pattern
    );
}

#[test]
fn identify_reads_all_three_id_commands() {
    let mut flash = open(DummyEcp5::new_default());
    assert_eq!(flash.read_device_id().unwrap(), 0x18);
    assert_eq!(flash.read_manufacturer_device_id().unwrap(), (0xEF, 0x18));
    assert_eq!(
        flash.read_manufacturer_long_device_id().unwrap(),
        (0xEF, 0x4018)
    );
}

#[test]
fn wakeup_and_deep_sleep_complete() {
    let mut flash = open(DummyEcp5::new_default());
    flash.wakeup().unwrap();
    flash.deep_sleep().unwrap();
}

#[test]
fn write_disable_clears_the_latch() {
    let mut flash = open(DummyEcp5::new_default());
    flash.write_enable().unwrap();
    assert!(flash.read_status().unwrap().contains(Status::WEL));
    flash.write_disable().unwrap();
    assert!(!flash.read_status().unwrap().contains(Status::WEL));
}

#[test]
fn read_chunks_and_reports_progress() {
    let pattern: Vec<u8> = (0..600u32).map(|i| (i * 7) as u8).collect();
    let device = DummyEcp5::new_default().with_data(0x100, &pattern);
    let mut flash = open(device);

    let mut sink = RecordingSink::default();
    let data = flash.read(0x100, 600, None, &mut sink).unwrap();
    assert_eq!(data, pattern);

    let dones: Vec<usize> = sink.0.iter().map(|r| r.0).collect();
    assert_eq!(dones, vec![0, 255, 510, 600]);
    assert!(sink.0[0].2.is_some());
    assert_eq!(sink.0.last().unwrap().2, None);
}

#[test]
fn fast_read_matches_read() {
    let pattern: Vec<u8> = (0..300u32).map(|i| (i ^ 0x5A) as u8).collect();
    let device = DummyEcp5::new_default().with_data(0x4000, &pattern);
    let mut flash = open(device);

    let slow = flash.read(0x4000, 300, None, &mut NoProgress).unwrap();
    let fast = flash.fast_read(0x4000, 300, None, &mut NoProgress).unwrap();
    assert_eq!(slow, pattern);
    assert_eq!(fast, pattern);
}

#[test]
fn read_honors_custom_chunk_size() {
    let mut flash = open(DummyEcp5::new_default());
    let mut sink = RecordingSink::default();
    flash.read(0, 100, Some(40), &mut sink).unwrap();
    let dones: Vec<usize> = sink.0.iter().map(|r| r.0).collect();
    assert_eq!(dones, vec![0, 40, 80, 100]);
}

#[test]
fn program_splits_on_page_boundaries() {
    let data = vec![0x5A; 48];
    let mut flash = open(DummyEcp5::new_default());
    let mut sink = RecordingSink::default();
    flash.program(0x0FF0, &data, 256, &mut sink).unwrap();

    let device = flash.release();
    assert_eq!(device.programs(), &[(0x0FF0, 16), (0x1000, 32)]);
    assert!(device.data()[0x0FF0..0x1020].iter().all(|&b| b == 0x5A));
    assert_eq!(sink.0.last().unwrap(), &(48, 48, None));
}

#[test]
fn erase_program_splices_partial_sectors() {
    let device = DummyEcp5::new_default()
        .with_data(0x0FE0, &[0x11; 16])
        .with_data(0x1010, &[0x22; 16]);
    let mut flash = open(device);
    flash
        .erase_program(0x0FF0, &[0xAA; 32], 4096, 256, &mut NoProgress)
        .unwrap();

    let device = flash.release();
    assert_eq!(device.erases(), &[0x0000, 0x1000]);
    let data = device.data();
    assert!(data[0x0FE0..0x0FF0].iter().all(|&b| b == 0x11));
    assert!(data[0x0FF0..0x1010].iter().all(|&b| b == 0xAA));
    assert!(data[0x1010..0x1020].iter().all(|&b| b == 0x22));
}

#[test]
fn erase_program_skips_programming_blank_sectors() {
    let mut flash = open(DummyEcp5::new_default());
    flash
        .erase_program(0x2000, &[0xFF; 4096], 4096, 256, &mut NoProgress)
        .unwrap();

    let device = flash.release();
    assert_eq!(device.erases(), &[0x2000]);
    assert!(device.programs().is_empty());
}

#[test]
fn erase_program_offsets_nested_progress() {
    let mut flash = open(DummyEcp5::new_default());
    let mut sink = RecordingSink::default();
    flash
        .erase_program(0x0000, &[0x33; 8192], 4096, 4096, &mut sink)
        .unwrap();

    // Second sector's page report is rebased past the first sector.
    assert!(sink
        .0
        .iter()
        .any(|r| r.0 == 4096 && r.1 == 8192 && r.2.as_deref().is_some_and(|s| s.starts_with("programming"))));
    assert_eq!(sink.0.last().unwrap(), &(8192, 8192, None));
}

#[test]
fn verify_passes_and_reports_first_mismatch() {
    let pattern: Vec<u8> = (0..200u32).map(|i| i as u8).collect();
    let device = DummyEcp5::new_default().with_data(0x3000, &pattern);
    let mut flash = open(device);
    flash.verify(0x3000, &pattern, &mut NoProgress).unwrap();

    let mut device = flash.release();
    device.data_mut()[0x3000 + 50] ^= 0xFF;
    let mut flash = open(device);
    match flash.verify(0x3000, &pattern, &mut NoProgress).unwrap_err() {
        Error::VerifyMismatch {
            addr,
            expected,
            actual,
        } => {
            assert_eq!(addr, 0x3000 + 50);
            assert_eq!(expected, 50);
            assert_eq!(actual, !50u8);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn block_protect_round_trips() {
    let mut flash = open(DummyEcp5::new_default());
    assert_eq!(flash.block_protect().unwrap(), 0);
    flash.set_block_protect(0b1010).unwrap();
    assert_eq!(flash.block_protect().unwrap(), 0b1010);
    // WEL must not survive the status write.
    assert!(!flash.read_status().unwrap().contains(Status::WEL));
    flash.set_block_protect(0).unwrap();
    assert_eq!(flash.block_protect().unwrap(), 0);
}

#[test]
fn failed_program_is_reported() {
    let config = DummyConfig {
        fail_writes: true,
        ..DummyConfig::default()
    };
    let mut flash = open(DummyEcp5::new(config));
    match flash
        .program(0, &[0x00; 16], 256, &mut NoProgress)
        .unwrap_err()
    {
        Error::CommandFailed { command, status } => {
            assert_eq!(command, "PAGE PROGRAM");
            assert_ne!(status & 0b10, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn transient_wel_read_is_not_a_failure() {
    // WEL-set/WIP-clear on a single status read is the settling race,
    // not a fault; the second read decides.
    let config = DummyConfig {
        transient_wel_reads: 1,
        ..DummyConfig::default()
    };
    let mut flash = open(DummyEcp5::new(config));
    flash.program(0, &[0x5A; 16], 256, &mut NoProgress).unwrap();

    let device = flash.release();
    assert_eq!(device.programs(), &[(0, 16)]);
}

#[test]
fn persistent_wel_reads_are_a_failure() {
    let config = DummyConfig {
        transient_wel_reads: 2,
        ..DummyConfig::default()
    };
    let mut flash = open(DummyEcp5::new(config));
    match flash
        .program(0, &[0x5A; 16], 256, &mut NoProgress)
        .unwrap_err()
    {
        Error::CommandFailed { command, .. } => assert_eq!(command, "PAGE PROGRAM"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn poll_limit_bounds_busy_waits() {
    let config = DummyConfig {
        busy_polls: 10,
        ..DummyConfig::default()
    };
    let mut flash = open(DummyEcp5::new(config.clone())).with_poll_limit(3);
    flash.write_enable().unwrap();
    match flash.sector_erase(0x1000).unwrap_err() {
        Error::PollTimeout { command, polls } => {
            assert_eq!(command, "SECTOR ERASE");
            assert_eq!(polls, 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Unbounded by default: the same erase just polls through.
    let mut flash = open(DummyEcp5::new(config));
    flash.write_enable().unwrap();
    flash.sector_erase(0x1000).unwrap();
}
