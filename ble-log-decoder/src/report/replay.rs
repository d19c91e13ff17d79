//! Replay script skeletons
//!
//! A [`ReplayScript`] is the reconstructed write sequence reduced to what a
//! replaying client needs: target identifier, payload and a pacing delay. It
//! renders as JSON or as a CoreBluetooth (Swift) skeleton to paste into a
//! client app. Nothing here talks to a device.

use crate::types::{AnalysisResult, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

pub const DEFAULT_REPLAY_DELAY_MS: u64 = 200;

/// Output format of a replay script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayFormat {
    Swift,
    Json,
}

impl ReplayFormat {
    /// File extension for the rendered script
    pub fn extension(&self) -> &'static str {
        match self {
            ReplayFormat::Swift => "swift",
            ReplayFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReplayFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "swift" => Ok(ReplayFormat::Swift),
            "json" => Ok(ReplayFormat::Json),
            other => Err(format!("unknown replay format: {} (expected swift or json)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub identifier: String,
    pub label: String,
    pub payload_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub delay_ms: u64,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    /// Build a script from every command of a result, in order
    pub fn from_result(result: &AnalysisResult, delay_ms: u64) -> Self {
        let steps = result
            .commands
            .iter()
            .filter(|cmd| !cmd.payload.is_empty())
            .map(|cmd| ReplayStep {
                identifier: cmd.identifier.clone(),
                label: cmd.label.clone(),
                payload_hex: cmd.payload_hex(),
            })
            .collect();
        Self { delay_ms, steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn render(&self, format: ReplayFormat) -> Result<String> {
        match format {
            ReplayFormat::Json => self.to_json(),
            ReplayFormat::Swift => Ok(self.render_swift()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// CoreBluetooth skeleton: one `writeValue` per step, spaced by `delay_ms`
    pub fn render_swift(&self) -> String {
        let mut out = String::new();
        if let Err(e) = self.write_swift(&mut out) {
            log::warn!("swift replay skeleton incomplete: {}", e);
        }
        out
    }

    fn write_swift(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "import CoreBluetooth")?;
        writeln!(out)?;
        writeln!(
            out,
            "// Replay skeleton: {} step(s), {} ms apart",
            self.steps.len(),
            self.delay_ms
        )?;
        writeln!(out, "struct ReplayStep {{")?;
        writeln!(out, "    let characteristic: CBUUID?")?;
        writeln!(out, "    let label: String")?;
        writeln!(out, "    let payload: [UInt8]")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(
            out,
            "let replayDelay: TimeInterval = {:.3}",
            self.delay_ms as f64 / 1000.0
        )?;
        writeln!(out)?;
        writeln!(out, "let replaySteps: [ReplayStep] = [")?;
        for step in &self.steps {
            writeln!(
                out,
                "    ReplayStep(characteristic: {}, label: \"{}\", payload: [{}]),",
                swift_characteristic(&step.identifier),
                step.label.replace('\\', "\\\\").replace('"', "\\\""),
                swift_bytes(&step.payload_hex)
            )?;
        }
        writeln!(out, "]")?;
        writeln!(out)?;
        writeln!(out, "func replay(on peripheral: CBPeripheral, characteristics: [CBUUID: CBCharacteristic]) {{")?;
        writeln!(out, "    for (index, step) in replaySteps.enumerated() {{")?;
        writeln!(out, "        guard let uuid = step.characteristic, let characteristic = characteristics[uuid] else {{ continue }}")?;
        writeln!(out, "        let writeType: CBCharacteristicWriteType =")?;
        writeln!(out, "            characteristic.properties.contains(.writeWithoutResponse) ? .withoutResponse : .withResponse")?;
        writeln!(out, "        DispatchQueue.main.asyncAfter(deadline: .now() + Double(index) * replayDelay) {{")?;
        writeln!(out, "            peripheral.writeValue(Data(step.payload), for: characteristic, type: writeType)")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")
    }
}

/// 16-bit, 32-bit or full 128-bit UUID text accepted by `CBUUID(string:)`
fn is_uuid_string(identifier: &str) -> bool {
    let hex = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit());
    match identifier.len() {
        4 | 8 => hex(identifier),
        36 => {
            let groups: Vec<&str> = identifier.split('-').collect();
            groups.iter().map(|g| g.len()).eq([8, 4, 4, 4, 12]) && groups.iter().all(|&g| hex(g))
        }
        _ => false,
    }
}

/// Unresolved targets become `nil` and are skipped at replay time
fn swift_characteristic(identifier: &str) -> String {
    if is_uuid_string(identifier) {
        format!("CBUUID(string: \"{}\")", identifier)
    } else {
        format!("nil /* {} */", identifier.replace("*/", "* /"))
    }
}

fn swift_bytes(payload_hex: &str) -> String {
    payload_hex
        .as_bytes()
        .chunks(2)
        .map(|pair| format!("0x{}", String::from_utf8_lossy(pair)))
        .collect::<Vec<_>>()
        .join(", ")
}
