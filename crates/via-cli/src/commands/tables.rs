//! Static table inspection command.

use clap::Args;
use serde::Serialize;
use via_dsp::{BIG_SINE, EXPO, PhaseOscillator, REV_EXPO, SINE_PREDIFF};
use via_modules::OwnedFamily;

#[derive(Args)]
pub struct TablesArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

/// Length and sampled entries of one table.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    name: &'static str,
    len: usize,
    /// `(index, value)` pairs
    anchors: Vec<(usize, i64)>,
}

/// Shape of the default wavetable family.
#[derive(Debug, Serialize)]
pub struct FamilySummary {
    tables: usize,
    cycle_len: usize,
    padded_len: usize,
    words: usize,
    max_morph: u32,
}

#[derive(Debug, Serialize)]
pub struct TablesReport {
    tables: Vec<TableSummary>,
    default_family: FamilySummary,
    /// Sine oscillator read back at quarter-cycle phases
    sine_quadrants: [i32; 4],
}

fn summarize<T: Copy + Into<i64>>(name: &'static str, table: &[T], at: &[usize]) -> TableSummary {
    TableSummary {
        name,
        len: table.len(),
        anchors: at.iter().map(|&i| (i, table[i].into())).collect(),
    }
}

pub fn report() -> anyhow::Result<TablesReport> {
    let owned = OwnedFamily::default_family()?;
    let family = owned.family()?;
    Ok(TablesReport {
        tables: vec![
            summarize("big_sine", &BIG_SINE, &[0, 1024, 2048, 3072, 4096]),
            summarize("sine_prediff", &SINE_PREDIFF, &[0, 1024, 4095]),
            summarize("expo", &EXPO, &[0, 384, 768, 4094, 4095]),
            summarize("rev_expo", &REV_EXPO, &[0, 384, 768, 4094, 4095]),
        ],
        default_family: FamilySummary {
            tables: family.table_count(),
            cycle_len: family.cycle_len(),
            padded_len: family.padded_len(),
            words: owned.data().len(),
            max_morph: family.max_morph(),
        },
        sine_quadrants: [0, 1, 2, 3].map(|q| PhaseOscillator::sine_from_flash(q << 30)),
    })
}

pub fn run(args: TablesArgs) -> anyhow::Result<()> {
    let report = report()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Static Tables");
    println!("=============\n");
    for table in &report.tables {
        println!("{:<14} {:>5} entries", table.name, table.len);
        for (index, value) in &table.anchors {
            println!("  [{index:>4}] = {value}");
        }
    }

    let family = &report.default_family;
    println!("\nDefault Family");
    println!("==============\n");
    println!("  tables:     {}", family.tables);
    println!("  cycle_len:  {}", family.cycle_len);
    println!("  padded_len: {}", family.padded_len);
    println!("  words:      {}", family.words);
    println!("  max_morph:  {:#x}", family.max_morph);

    println!("\nSine at 0, 1/4, 1/2, 3/4 cycle: {:?}", report.sine_quadrants);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_anchors() {
        let report = report().unwrap();
        let sine = &report.tables[0];
        assert_eq!(sine.len, 4097);
        assert_eq!(sine.anchors[0], (0, i64::from(BIG_SINE[0])));
        assert_eq!(report.default_family.tables, 9);
        assert_eq!(report.default_family.words, 9 * 517);
        assert_eq!(report.sine_quadrants[0], BIG_SINE[0]);
    }
}
