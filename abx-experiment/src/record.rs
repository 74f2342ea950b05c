use abx_core::{StimulusRecord, TrialResponse};
use serde::Serialize;
use std::io::{self, Write};

/// Column order of the response log
pub const COLUMNS: [&str; 21] = [
    "participant",
    "trial_index",
    "is_practice",
    "condition",
    "A_driver",
    "A_lap",
    "A_seg",
    "A_path",
    "B_driver",
    "B_lap",
    "B_seg",
    "B_path",
    "X_driver",
    "X_lap",
    "X_seg",
    "X_path",
    "answer",
    "correct_answer",
    "is_correct",
    "rt_ms",
    "timestamp",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One flattened row of the response log, as sent to sinks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRow {
    pub participant: String,
    pub trial_index: usize,
    pub is_practice: bool,
    pub condition: String,
    #[serde(rename = "A_driver")]
    pub a_driver: String,
    #[serde(rename = "A_lap")]
    pub a_lap: Option<u32>,
    #[serde(rename = "A_seg")]
    pub a_seg: Option<u32>,
    #[serde(rename = "A_path")]
    pub a_path: String,
    #[serde(rename = "B_driver")]
    pub b_driver: String,
    #[serde(rename = "B_lap")]
    pub b_lap: Option<u32>,
    #[serde(rename = "B_seg")]
    pub b_seg: Option<u32>,
    #[serde(rename = "B_path")]
    pub b_path: String,
    #[serde(rename = "X_driver")]
    pub x_driver: String,
    #[serde(rename = "X_lap")]
    pub x_lap: Option<u32>,
    #[serde(rename = "X_seg")]
    pub x_seg: Option<u32>,
    #[serde(rename = "X_path")]
    pub x_path: String,
    pub answer: String,
    pub correct_answer: Option<String>,
    pub is_correct: Option<u8>,
    pub rt_ms: u64,
    pub timestamp: String,
}

struct Slot {
    driver: String,
    lap: Option<u32>,
    seg: Option<u32>,
    path: String,
}

impl From<&StimulusRecord> for Slot {
    fn from(record: &StimulusRecord) -> Self {
        let meta = record.meta();
        Slot {
            driver: record.driver.to_string(),
            lap: meta.lap,
            seg: meta.seg,
            path: record.path.clone(),
        }
    }
}

impl ResponseRow {
    pub fn from_response(participant: &str, response: &TrialResponse) -> Self {
        let trial = &response.trial;
        let a = Slot::from(&trial.a);
        let b = Slot::from(&trial.b);
        let x = Slot::from(&trial.x);
        Self {
            participant: participant.to_string(),
            trial_index: response.trial_index,
            is_practice: response.is_practice,
            condition: trial.condition.to_string(),
            a_driver: a.driver,
            a_lap: a.lap,
            a_seg: a.seg,
            a_path: a.path,
            b_driver: b.driver,
            b_lap: b.lap,
            b_seg: b.seg,
            b_path: b.path,
            x_driver: x.driver,
            x_lap: x.lap,
            x_seg: x.seg,
            x_path: x.path,
            answer: response.chosen.to_string(),
            correct_answer: trial.correct_answer.map(|s| s.to_string()),
            is_correct: response.is_correct.map(u8::from),
            rt_ms: response.reaction_time_ms,
            timestamp: response.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Cell values in [`COLUMNS`] order; absent values are empty strings
    pub fn cells(&self) -> Vec<String> {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        vec![
            self.participant.clone(),
            self.trial_index.to_string(),
            practice_cell(self.is_practice).to_string(),
            self.condition.clone(),
            self.a_driver.clone(),
            opt(&self.a_lap),
            opt(&self.a_seg),
            self.a_path.clone(),
            self.b_driver.clone(),
            opt(&self.b_lap),
            opt(&self.b_seg),
            self.b_path.clone(),
            self.x_driver.clone(),
            opt(&self.x_lap),
            opt(&self.x_seg),
            self.x_path.clone(),
            self.answer.clone(),
            opt(&self.correct_answer),
            opt(&self.is_correct),
            self.rt_ms.to_string(),
            self.timestamp.clone(),
        ]
    }
}

/// Capitalised like the pilot's sheet exports so both sources parse alike
fn practice_cell(is_practice: bool) -> &'static str {
    if is_practice { "True" } else { "False" }
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// One CSV line, newline included
pub fn csv_line<S: AsRef<str>>(cells: &[S]) -> String {
    let mut line = cells
        .iter()
        .map(|c| escape(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Writes a header line followed by one line per row
pub fn write_csv<W: Write>(mut out: W, rows: &[ResponseRow]) -> io::Result<()> {
    out.write_all(csv_line(&COLUMNS).as_bytes())?;
    for row in rows {
        out.write_all(csv_line(&row.cells()).as_bytes())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use abx_core::{AbxTrial, Condition, Construction, Side};
    use chrono::{TimeZone, Utc};

    fn response(chosen: Side) -> TrialResponse {
        let trial = AbxTrial::from_triad(
            Condition::Viz,
            StimulusRecord::new(Condition::Viz, "RUS", "RUS/rus_lap4_seg2_fp.png"),
            StimulusRecord::new(Condition::Viz, "VER", "VER/ver_lap7_fp.png"),
            StimulusRecord::new(Condition::Viz, "VER", "VER/ver_lap9_seg1_fp.png"),
            Construction::Paired,
        );
        TrialResponse {
            trial_index: 3,
            is_practice: false,
            is_correct: trial.score(chosen),
            trial,
            chosen,
            reaction_time_ms: 1234,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 9, 15, 30).unwrap(),
        }
    }

    #[test]
    fn row_flattens_trial_and_path_metadata() {
        let row = ResponseRow::from_response("p01", &response(Side::A));
        let cells = row.cells();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(
            cells,
            vec![
                "p01",
                "3",
                "False",
                "viz",
                "RUS",
                "4",
                "2",
                "RUS/rus_lap4_seg2_fp.png",
                "VER",
                "7",
                "",
                "VER/ver_lap7_fp.png",
                "VER",
                "9",
                "1",
                "VER/ver_lap9_seg1_fp.png",
                "A",
                "B",
                "0",
                "1234",
                "2024-03-02T09:15:30",
            ]
        );
    }

    #[test]
    fn correct_answer_scores_one() {
        let row = ResponseRow::from_response("p01", &response(Side::B));
        assert_eq!(row.is_correct, Some(1));
        assert_eq!(row.correct_answer.as_deref(), Some("B"));
    }

    #[test]
    fn practice_flag_is_capitalised() {
        let mut practice = response(Side::A);
        practice.is_practice = true;
        let row = ResponseRow::from_response("p01", &practice);
        assert_eq!(row.cells()[2], "True");
        assert_eq!(ResponseRow::from_response("p01", &response(Side::A)).cells()[2], "False");
    }

    #[test]
    fn csv_quotes_cells_that_need_it() {
        assert_eq!(csv_line(&["a", "b,c", "say \"hi\""]), "a,\"b,c\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn csv_starts_with_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[ResponseRow::from_response("p01", &response(Side::A))]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert!(lines.next().unwrap().starts_with("p01,3,False,viz,RUS,4,2,"));
        assert!(lines.next().is_none());
    }
}
