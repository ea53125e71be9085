use std::io::Write;

use chrono_tz::Tz;
use csv::Writer;

use crate::table::Table;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

impl Table {
    /// Writes the table as CSV, index first, timestamps rendered in `timezone`.
    pub fn write_csv<W: Write>(&self, writer: W, timezone: Tz) -> csv::Result<()> {
        let mut w = Writer::from_writer(writer);

        let mut header = vec![self.index_name()];
        header.extend(self.column_names());
        w.write_record(&header)?;

        for (i, timestamp) in self.index().iter().enumerate() {
            let mut record = vec![
                timestamp
                    .with_timezone(&timezone)
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            ];
            record.extend(self.row(i).map(|(_, cell)| cell.to_field()));
            w.write_record(&record)?;
        }

        w.flush()?;
        Ok(())
    }
}
