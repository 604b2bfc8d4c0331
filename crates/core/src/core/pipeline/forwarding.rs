//! Forwarding buffers.
//!
//! Three fixed-shape tables record recently produced register values, keyed
//! by the producer's stage position:
//!
//! ```text
//! id rows (feed ID):  0=EX1  1=EX2  2=EX3  3=MEM
//! ex rows (feed EX1): 0=EX2  1=EX3  2=MEM
//! da row  (feed MEM): 0=MEM
//! ```
//!
//! Producers fill their rows as they advance; bubbles clear the rows they
//! would have owned. Consumers take the first valid row matching the
//! register they need and overwrite their operand snapshot with it.

/// One forwarding row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FwdRow {
    /// Destination register of the producing instruction.
    pub dest: usize,
    /// The produced value.
    pub value: i32,
    /// Whether the row may be consumed.
    pub valid: bool,
}

/// The three forwarding tables.
#[derive(Debug, Default)]
pub struct Forwarding {
    /// Rows feeding the ID stage.
    pub id: [FwdRow; 4],
    /// Rows feeding the EX1 stage.
    pub ex: [FwdRow; 3],
    /// Row feeding the MEM stage.
    pub da: [FwdRow; 1],
}

fn lookup(rows: &[FwdRow], reg: usize) -> Option<i32> {
    rows.iter()
        .find(|row| row.valid && row.dest == reg)
        .map(|row| row.value)
}

fn fill(row: &mut FwdRow, dest: usize, value: i32) {
    *row = FwdRow {
        dest,
        value,
        valid: true,
    };
}

impl Forwarding {
    /// First valid ID-table row producing `reg`, if any.
    pub fn id_lookup(&self, reg: usize) -> Option<i32> {
        lookup(&self.id, reg)
    }

    /// First valid EX-table row producing `reg`, if any.
    pub fn ex_lookup(&self, reg: usize) -> Option<i32> {
        lookup(&self.ex, reg)
    }

    /// The DA-table row, when it produces `reg`.
    pub fn da_lookup(&self, reg: usize) -> Option<i32> {
        lookup(&self.da, reg)
    }

    /// Fills ID row `idx`.
    pub fn set_id(&mut self, idx: usize, dest: usize, value: i32) {
        fill(&mut self.id[idx], dest, value);
    }

    /// Fills EX row `idx`.
    pub fn set_ex(&mut self, idx: usize, dest: usize, value: i32) {
        fill(&mut self.ex[idx], dest, value);
    }

    /// Fills the DA row.
    pub fn set_da(&mut self, idx: usize, dest: usize, value: i32) {
        fill(&mut self.da[idx], dest, value);
    }

    /// Invalidates ID row `idx`.
    pub fn clear_id(&mut self, idx: usize) {
        self.id[idx] = FwdRow::default();
    }

    /// Invalidates EX row `idx`.
    pub fn clear_ex(&mut self, idx: usize) {
        self.ex[idx] = FwdRow::default();
    }

    /// Invalidates the DA row.
    pub fn clear_da(&mut self, idx: usize) {
        self.da[idx] = FwdRow::default();
    }
}
