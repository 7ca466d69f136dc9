//! Rebuilds the golden cases under `tests/golden/`.
//!
//! `golden_fixtures inputs` writes each `input.sfr` from typed ensembles,
//! `golden_fixtures reports` decodes them into `expected_report.json`, and
//! no argument does both.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fintrace_core::packet::parser::encode_header;
use fintrace_core::{
    Armor, Ensemble, GpsFix, ImuTriad, Payload, Thermal, analyze_file, encode,
};

const TAG_UNKNOWN: u8 = 0x0D;
const TAG_TEXT: u8 = 0x0F;
const ARMOR: Armor = Armor::Base64Url;
const INPUT_NAME: &str = "input.sfr";
const REPORT_NAME: &str = "expected_report.json";

struct GoldenCase {
    name: &'static str,
    lines: fn() -> Vec<String>,
}

const CASES: [GoldenCase; 3] = [
    GoldenCase {
        name: "clean",
        lines: clean_lines,
    },
    GoldenCase {
        name: "corrupt",
        lines: corrupt_lines,
    },
    GoldenCase {
        name: "imu_padding",
        lines: imu_padding_lines,
    },
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
    Inputs,
    Reports,
    All,
}

fn main() -> ExitCode {
    let step = match std::env::args().nth(1).as_deref() {
        None => Step::All,
        Some("inputs") => Step::Inputs,
        Some("reports") => Step::Reports,
        Some(other) => {
            eprintln!("error: unknown step '{other}' (expected inputs or reports)");
            return ExitCode::from(2);
        }
    };
    let root = PathBuf::from("tests").join("golden");
    for case in &CASES {
        if let Err(err) = rebuild(&root.join(case.name), case, step) {
            eprintln!("error: {}: {}", case.name, err);
            return ExitCode::from(1);
        }
    }
    ExitCode::SUCCESS
}

fn rebuild(dir: &Path, case: &GoldenCase, step: Step) -> Result<(), String> {
    let input = dir.join(INPUT_NAME);
    if step != Step::Reports {
        write_lines(&input, &(case.lines)())?;
    }
    if step != Step::Inputs {
        write_report(&input, &dir.join(REPORT_NAME))?;
    }
    Ok(())
}

fn write_report(input: &Path, output: &Path) -> Result<(), String> {
    let mut report = analyze_file(input, ARMOR)
        .map_err(|err| format!("decoding {} failed: {}", input.display(), err))?;
    // Reports must not depend on where the checkout lives.
    report.input.path = INPUT_NAME.to_string();
    let json = serde_json::to_string(&report).map_err(|err| err.to_string())?;
    fs::write(output, json).map_err(|err| format!("writing {} failed: {}", output.display(), err))
}

fn clean_lines() -> Vec<String> {
    let first = [
        thermal(0, 2560, 0),
        vec![0; 4],
        record(
            5,
            Payload::TempWaterEpoch(
                Thermal {
                    temp: 2600,
                    water: 1,
                },
                1_600_000_000,
            ),
        ),
    ]
    .concat();
    let second = [
        record(10, Payload::Battery { millivolts: 3900 }),
        record(
            12345,
            Payload::ImuFixed(ImuTriad {
                acc: [1024, 0, -512],
                gyro: [128, 0, 0],
                mag: [8, 16, 0],
            }),
        ),
        record(20, Payload::Text("boot ok".to_string())),
        vec![0; 6],
    ]
    .concat();
    vec![ARMOR.encode(&first), ARMOR.encode(&second)]
}

fn corrupt_lines() -> Vec<String> {
    let unknown = [
        thermal(1, 1280, 1),
        vec![TAG_UNKNOWN, 0, 0],
        thermal(2, 1290, 1),
    ]
    .concat();
    let mut truncated = record(3, Payload::Battery { millivolts: 3700 });
    let imu = record(
        4,
        Payload::Imu(ImuTriad {
            acc: [100, 200, 300],
            gyro: [400, 500, 600],
            mag: [700, 800, 900],
        }),
    );
    // Header plus 10 of the 18 payload bytes.
    truncated.extend_from_slice(&imu[..13]);
    let mut lossy = encode_header(TAG_TEXT, 5).to_vec();
    lossy.extend_from_slice(&[3, b'f', 0xFF, b'o']);

    vec![
        ARMOR.encode(&unknown),
        "@@@not-armor@@@".to_string(),
        ARMOR.encode(&truncated),
        ARMOR.encode(&lossy),
        String::new(),
    ]
}

fn imu_padding_lines() -> Vec<String> {
    let imu = record(
        100,
        Payload::Imu(ImuTriad {
            acc: [16384, 0, -16384],
            gyro: [131, -131, 0],
            mag: [100, -100, 0],
        }),
    );
    let full = record(
        101,
        Payload::TempWaterImuGps(
            Thermal {
                temp: 3200,
                water: 1,
            },
            ImuTriad {
                acc: [0, 0, 16384],
                gyro: [0, 0, 0],
                mag: [10, 20, 30],
            },
            GpsFix {
                lat: 327_157_000,
                lon: -1_171_611_000,
            },
        ),
    );
    vec![
        ARMOR.encode(&[0; 50]),
        ARMOR.encode(&[imu, vec![0; 3], full].concat()),
    ]
}

fn record(timestamp_ds: u32, payload: Payload) -> Vec<u8> {
    encode(&Ensemble::new(timestamp_ds, payload))
}

fn thermal(timestamp_ds: u32, temp: i16, water: i8) -> Vec<u8> {
    record(timestamp_ds, Payload::TempWater(Thermal { temp, water }))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("creating {} failed: {}", parent.display(), err))?;
    }
    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(path, text).map_err(|err| format!("writing {} failed: {}", path.display(), err))
}
