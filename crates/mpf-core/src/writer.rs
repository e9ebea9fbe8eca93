//! Output sinks
//!
//! A [`Writer`] receives, in call order, a header row, numeric rows,
//! section breaks and free-text lines. Implementations must preserve that
//! order in what they emit.

use std::io::{self, Write};

/// Ordered output sink for draws and status text
pub trait Writer {
    /// Header row of field names
    ///
    /// # Errors
    /// Propagates I/O failures of the underlying sink
    fn write_header(&mut self, names: &[String]) -> io::Result<()>;

    /// One numeric row
    ///
    /// # Errors
    /// Propagates I/O failures of the underlying sink
    fn write_row(&mut self, values: &[f64]) -> io::Result<()>;

    /// Empty section break
    ///
    /// # Errors
    /// Propagates I/O failures of the underlying sink
    fn write_break(&mut self) -> io::Result<()>;

    /// Free-text line
    ///
    /// # Errors
    /// Propagates I/O failures of the underlying sink
    fn write_text(&mut self, line: &str) -> io::Result<()>;

    /// Push buffered output to the underlying sink
    ///
    /// # Errors
    /// Propagates I/O failures of the underlying sink
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write_header(&mut self, names: &[String]) -> io::Result<()> {
        (**self).write_header(names)
    }

    fn write_row(&mut self, values: &[f64]) -> io::Result<()> {
        (**self).write_row(values)
    }

    fn write_break(&mut self) -> io::Result<()> {
        (**self).write_break()
    }

    fn write_text(&mut self, line: &str) -> io::Result<()> {
        (**self).write_text(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write_header(&mut self, names: &[String]) -> io::Result<()> {
        (**self).write_header(names)
    }

    fn write_row(&mut self, values: &[f64]) -> io::Result<()> {
        (**self).write_row(values)
    }

    fn write_break(&mut self) -> io::Result<()> {
        (**self).write_break()
    }

    fn write_text(&mut self, line: &str) -> io::Result<()> {
        (**self).write_text(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Comma-separated writer; breaks and text become comment lines
#[derive(Debug)]
pub struct CsvWriter<W: io::Write> {
    out: W,
    comment_prefix: String,
}

impl<W: io::Write> CsvWriter<W> {
    /// Create with the default `#` comment prefix
    #[inline]
    pub fn new(out: W) -> Self {
        Self::with_comment_prefix(out, "#")
    }

    /// Create with a custom comment prefix
    #[inline]
    pub fn with_comment_prefix(out: W, prefix: impl Into<String>) -> Self {
        Self {
            out,
            comment_prefix: prefix.into(),
        }
    }

    /// Flush and return the underlying sink
    ///
    /// # Errors
    /// Propagates the flush failure
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: io::Write> Writer for CsvWriter<W> {
    fn write_header(&mut self, names: &[String]) -> io::Result<()> {
        writeln!(self.out, "{}", names.join(","))
    }

    fn write_row(&mut self, values: &[f64]) -> io::Result<()> {
        let mut first = true;
        for value in values {
            if !first {
                self.out.write_all(b",")?;
            }
            write!(self.out, "{value}")?;
            first = false;
        }
        self.out.write_all(b"\n")
    }

    fn write_break(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", self.comment_prefix)
    }

    fn write_text(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{} {line}", self.comment_prefix)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Writer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl Writer for NullWriter {
    fn write_header(&mut self, _names: &[String]) -> io::Result<()> {
        Ok(())
    }

    fn write_row(&mut self, _values: &[f64]) -> io::Result<()> {
        Ok(())
    }

    fn write_break(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_text(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}
