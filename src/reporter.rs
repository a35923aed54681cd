use std::io::{self, Write};

use crate::stats::{AsnCount, ProgressCounters};

const CLEAR_LINE: &str = "\x1b[K";
const PREVIOUS_LINE: &str = "\x1b[F";

/// Receives the latest progress and ranking after every completed lookup.
pub trait Reporter {
    fn render(&mut self, counters: &ProgressCounters, snapshot: &[AsnCount]) -> io::Result<()>;

    /// Called once after the last result; the output it leaves behind stays on screen.
    fn finish(&mut self, counters: &ProgressCounters, snapshot: &[AsnCount]) -> io::Result<()>;
}

/// Writes the progress line and one line per ranked ASN. Returns the number of ranking lines.
pub fn render_block<W: Write>(
    out: &mut W,
    counters: &ProgressCounters,
    snapshot: &[AsnCount],
) -> io::Result<usize> {
    writeln!(
        out,
        "{CLEAR_LINE}\r[{}/{}] IPs checked",
        counters.succeeded(),
        counters.total
    )?;
    for (asn, count) in snapshot {
        writeln!(out, "{CLEAR_LINE}\rASN: {asn}, Occurrences: {count}")?;
    }
    Ok(snapshot.len())
}

/// Redraws the block in place using ANSI cursor movement.
pub struct TerminalReporter<W: Write> {
    out: W,
    previous_lines: usize,
}

impl<W: Write> TerminalReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            previous_lines: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, counters: &ProgressCounters, snapshot: &[AsnCount]) -> io::Result<usize> {
        let mut lines = render_block(&mut self.out, counters, snapshot)?;
        // Blank out rows left over from a taller previous block.
        while lines < self.previous_lines {
            writeln!(self.out, "{CLEAR_LINE}")?;
            lines += 1;
        }
        Ok(lines)
    }
}

impl<W: Write> Reporter for TerminalReporter<W> {
    fn render(&mut self, counters: &ProgressCounters, snapshot: &[AsnCount]) -> io::Result<()> {
        let lines = self.draw(counters, snapshot)?;
        // Back to the progress line so the next render overwrites this one.
        write!(self.out, "{}", PREVIOUS_LINE.repeat(lines + 1))?;
        self.out.flush()?;
        self.previous_lines = lines;
        Ok(())
    }

    fn finish(&mut self, counters: &ProgressCounters, snapshot: &[AsnCount]) -> io::Result<()> {
        self.draw(counters, snapshot)?;
        self.previous_lines = 0;
        self.out.flush()
    }
}

/// For pipes and logs: stays silent until the run is over, then prints the block once.
pub struct SummaryReporter<W: Write> {
    out: W,
}

impl<W: Write> SummaryReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for SummaryReporter<W> {
    fn render(&mut self, _counters: &ProgressCounters, _snapshot: &[AsnCount]) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, counters: &ProgressCounters, snapshot: &[AsnCount]) -> io::Result<()> {
        writeln!(self.out, "[{}/{}] IPs checked", counters.succeeded(), counters.total)?;
        for (asn, count) in snapshot {
            writeln!(self.out, "ASN: {asn}, Occurrences: {count}")?;
        }
        self.out.flush()
    }
}
