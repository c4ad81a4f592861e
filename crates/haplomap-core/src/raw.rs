//! Raw annotation rows and the column contract
//!
//! The annotation table is consumed as string cells. [`Column`] names the
//! cells the pipeline reads; [`ColumnIndex`] locates them in a header row and
//! turns data rows into [`RawRecord`]s. Header cells are matched after
//! trimming by prefix, so the long descriptive AADR headers, e.g.
//! `Date mean in BP in years before 1950 CE [OxCal mu for a direct
//! radiocarbon date, ...]`, need not be spelled out in full.

use std::fmt;

/// A cell of the annotation table used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    GeneticId,
    Latitude,
    Longitude,
    DateMeanBp,
    FullDate,
    HaplogroupY,
    HaplogroupMt,
    PoliticalEntity,
}

impl Column {
    pub const LEN: usize = 8;

    pub const ALL: [Column; Self::LEN] = [
        Column::GeneticId,
        Column::Latitude,
        Column::Longitude,
        Column::DateMeanBp,
        Column::FullDate,
        Column::HaplogroupY,
        Column::HaplogroupMt,
        Column::PoliticalEntity,
    ];

    /// Header text (or header prefix) identifying the column.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Column::GeneticId => "Genetic ID",
            Column::Latitude => "Lat.",
            Column::Longitude => "Long.",
            Column::DateMeanBp => "Date mean in BP in years before 1950 CE",
            Column::FullDate => "Full Date",
            Column::HaplogroupY => "Y haplogroup (manual curation in ISOGG format)",
            Column::HaplogroupMt => "mtDNA haplogroup if >2x or published",
            Column::PoliticalEntity => "Political Entity",
        }
    }

    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Column::Latitude
                | Column::Longitude
                | Column::DateMeanBp
                | Column::HaplogroupY
                | Column::HaplogroupMt
        )
    }

    #[must_use]
    pub fn matches(self, header: &str) -> bool {
        header.trim().starts_with(self.header())
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.header(), f)
    }
}

/// One data row, reduced to the cells of [`Column`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based data row number, used for derived ids and diagnostics
    pub row: usize,
    cells: [Option<String>; Column::LEN],
}

impl RawRecord {
    #[must_use]
    pub fn new(row: usize) -> Self {
        Self {
            row,
            cells: Default::default(),
        }
    }

    /// Builder-style variant of [`Self::set`].
    #[must_use]
    pub fn with(mut self, column: Column, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        self.cells[column.index()] = Some(value.into());
    }

    /// The cell value, or `None` if the column is absent from the table.
    #[must_use]
    pub fn get(&self, column: Column) -> Option<&str> {
        self.cells[column.index()].as_deref()
    }
}

/// Required columns that were not found in the header row.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error)]
pub struct MissingColumns {
    pub missing: Vec<Column>,
}

impl fmt::Display for MissingColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required columns: ")?;
        for (i, column) in self.missing.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", column.header())?;
        }
        Ok(())
    }
}

/// Positions of the contract columns within a table's header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    positions: [Option<usize>; Column::LEN],
}

impl ColumnIndex {
    /// Locates every column in `headers`; the first matching header wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use haplomap_core::raw::{Column, ColumnIndex};
    ///
    /// let headers = [
    ///     "Genetic ID",
    ///     "Date mean in BP in years before 1950 CE [OxCal mu]",
    ///     "Lat.",
    ///     "Long.",
    ///     "Y haplogroup (manual curation in ISOGG format)",
    ///     "mtDNA haplogroup if >2x or published",
    /// ];
    /// let index = ColumnIndex::from_headers(headers).unwrap();
    /// assert_eq!(index.position(Column::Latitude), Some(2));
    /// assert_eq!(index.position(Column::PoliticalEntity), None);
    ///
    /// let record = index.record(7, ["I1", "3500", "45.1", "9.2", "R1b", ".."]);
    /// assert_eq!(record.get(Column::DateMeanBp), Some("3500"));
    /// ```
    pub fn from_headers<I, S>(headers: I) -> Result<Self, MissingColumns>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = [None; Column::LEN];
        for (position, header) in headers.into_iter().enumerate() {
            for column in Column::ALL {
                let slot = &mut positions[column.index()];
                if slot.is_none() && column.matches(header.as_ref()) {
                    *slot = Some(position);
                }
            }
        }

        let missing: Vec<Column> = Column::ALL
            .into_iter()
            .filter(|column| column.is_required() && positions[column.index()].is_none())
            .collect();
        if !missing.is_empty() {
            return Err(MissingColumns { missing });
        }
        Ok(Self { positions })
    }

    #[must_use]
    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions[column.index()]
    }

    /// Builds a record from the cells of one data row.
    ///
    /// Short rows leave the cells they lack unset.
    pub fn record<I, S>(&self, row: usize, cells: I) -> RawRecord
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut record = RawRecord::new(row);
        for (position, cell) in cells.into_iter().enumerate() {
            if let Some(column) = Column::ALL
                .into_iter()
                .find(|column| self.position(*column) == Some(position))
            {
                record.set(column, cell);
            }
        }
        record
    }
}
