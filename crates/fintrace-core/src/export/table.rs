//! CSV rendering of converted ensembles.

use std::io::Write;

use crate::units::SiEnsemble;

const FIXED_COLUMNS: [&str; 2] = ["timestamp", "dataType"];

/// Column layout: fixed columns, raw names, then derived names, each in
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvColumns {
    raw: Vec<&'static str>,
    derived: Vec<String>,
}

impl CsvColumns {
    pub fn collect(rows: &[SiEnsemble]) -> Self {
        let mut columns = Self::default();
        for row in rows {
            for (name, _) in row.ensemble.raw_fields() {
                if !columns.raw.contains(&name) {
                    columns.raw.push(name);
                }
            }
            for (name, _) in &row.derived {
                if !columns.derived.contains(name) {
                    columns.derived.push(name.clone());
                }
            }
        }
        columns
    }

    pub fn header(&self) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(|name| name.to_string())
            .chain(self.raw.iter().map(|name| name.to_string()))
            .chain(self.derived.iter().cloned())
            .collect()
    }

    pub fn row(&self, row: &SiEnsemble) -> Vec<String> {
        let raw = row.ensemble.raw_fields();
        let mut cells = vec![
            format!("{:.1}", row.ensemble.timestamp()),
            row.ensemble.data_type().value().to_string(),
        ];
        cells.extend(self.raw.iter().map(|name| {
            raw.iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        }));
        cells.extend(self.derived.iter().map(|name| {
            row.get(name)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        cells
    }
}

/// Write header and one record per ensemble.
pub fn write_csv<W: Write>(out: W, rows: &[SiEnsemble]) -> Result<(), csv::Error> {
    let columns = CsvColumns::collect(rows);
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(columns.header())?;
    for row in rows {
        wtr.write_record(columns.row(row))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::ensemble::{Ensemble, Payload, Thermal};
    use crate::units::{Calibration, convert};

    #[test]
    fn columns_follow_first_seen_order() {
        let ensembles = vec![
            Ensemble::new(
                10,
                Payload::TempWater(Thermal {
                    temp: 2560,
                    water: 1,
                }),
            ),
            Ensemble::new(20, Payload::Battery { millivolts: 3700 }),
            Ensemble::new(25, Payload::Text("hello, fin".to_string())),
        ];
        let rows = convert(&ensembles, &Calibration::new());
        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,dataType,temp,water,battery,text,Temperature (C),Water Detect,Battery (V)"
        );
        assert_eq!(lines[1], "1.0,1,2560,1,,,20,true,");
        assert_eq!(lines[2], "2.0,7,,,3700,,,,3.7");
        assert_eq!(lines[3], "2.5,15,,,,\"hello, fin\",,,");
    }

    #[test]
    fn quotes_text_with_quotes_and_newlines() {
        let ensembles = vec![Ensemble::new(
            5,
            Payload::Text("say \"hi\"\nagain".to_string()),
        )];
        let rows = convert(&ensembles, &Calibration::new());
        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "timestamp,dataType,text\n0.5,15,\"say \"\"hi\"\"\nagain\"\n");
    }
}
