//! CSV serialization of the event list.

use hoopclip_models::Event;

use crate::error::{ExportError, ExportResult};

/// Column header row.
pub const CSV_HEADER: [&str; 3] = ["label", "start_s", "end_s"];

/// Serialize events to CSV with a `label,start_s,end_s` header.
///
/// Rows keep store order. Labels containing delimiters or quotes are
/// quoted. Seconds are written in shortest round-trip form with at least
/// one decimal place (`5.0`, `12.25`).
pub fn events_to_csv(events: &[Event]) -> ExportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for event in events {
        let start = format_decimal(event.start_s);
        let end = format_decimal(event.end_s);
        writer.write_record([event.label.as_str(), start.as_str(), end.as_str()])?;
    }

    writer.into_inner().map_err(|e| {
        ExportError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })
}

fn format_decimal(value: f64) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_csv_rows_in_order() {
        let events = vec![
            Event::new("Shot", 0.0, 5.0),
            Event::new("Foul/TO", 10.0, 12.0),
        ];
        let csv = events_to_csv(&events).unwrap();
        assert_eq!(
            lines(&csv),
            ["label,start_s,end_s", "Shot,0.0,5.0", "Foul/TO,10.0,12.0"]
        );
    }

    #[test]
    fn test_csv_empty_list_is_header_only() {
        let csv = events_to_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "label,start_s,end_s\n");
    }

    #[test]
    fn test_csv_quotes_labels_with_commas() {
        let events = vec![Event::new("Shot, corner 3", 1.5, 4.25)];
        let csv = events_to_csv(&events).unwrap();
        assert_eq!(lines(&csv)[1], "\"Shot, corner 3\",1.5,4.25");
    }

    #[test]
    fn test_csv_reads_back() {
        let events = vec![
            Event::new("Possession", 61.125, 90.0),
            Event::new("Other \"late\"", 3600.0, 3601.5),
        ];
        let csv = events_to_csv(&events).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_slice());
        let parsed: Vec<Event> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                Event::new(&r[0], r[1].parse().unwrap(), r[2].parse().unwrap())
            })
            .collect();
        assert_eq!(parsed, events);
    }
}
