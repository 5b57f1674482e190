//! Human-readable report of a derived row.
//!
//! Renders the same figures as the ledger row, formatted the same way.

use std::fmt::{self, Write};

use crate::models::{format_estimate, format_timestamp, AgeBucket, BlockSize, DerivedRow};

/// Display adapter for the text report of one row.
pub struct Summary<'a>(pub &'a DerivedRow);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, self.0)
    }
}

pub fn render_summary(row: &DerivedRow) -> String {
    Summary(row).to_string()
}

fn write_summary<W: Write>(out: &mut W, row: &DerivedRow) -> fmt::Result {
    writeln!(out, "### Current Waitlist Summary ###")?;
    writeln!(out, "As of {}, the waitlist has **{} requests**.", format_timestamp(&row.timestamp), row.total_requests)?;
    writeln!(out, "The requests are for the following network sizes:")?;
    for (size, count) in row.requests.iter() {
        writeln!(out, "* **{size}:** {count} requests")?;
    }
    if row.skipped_records > 0 {
        writeln!(out, "({} malformed records were skipped.)", row.skipped_records)?;
    }
    writeln!(out, "\n---")?;

    writeln!(out, "### Changes Since Previous Snapshot ###")?;
    for size in BlockSize::ALL {
        writeln!(
            out,
            "* **{size}:** +{} / -{}",
            row.added.get(size),
            row.removed.get(size)
        )?;
    }
    writeln!(
        out,
        "Total: {} added, {} removed, net change {:+}.",
        row.total_added, row.total_removed, row.net_change
    )?;
    if row.range_changed > 0 {
        writeln!(out, "{} requests changed their accepted size range.", row.range_changed)?;
    }
    writeln!(out, "\n---")?;

    writeln!(out, "### Flexibility ###")?;
    writeln!(
        out,
        "* **{}** exact-size requests, **{}** flexible requests",
        row.exact_requests, row.flexible_requests
    )?;
    writeln!(out, "* Average flexibility: **{:.2}** size steps", row.avg_flexibility_degree)?;
    writeln!(out, "\n---")?;

    writeln!(out, "### Time on Waitlist ###")?;
    for size in BlockSize::ALL {
        let buckets: Vec<String> = AgeBucket::ALL
            .iter()
            .map(|bucket| format!("{}: {}", bucket.label(), row.age_count(size, *bucket)))
            .collect();
        writeln!(out, "* **{size}:** {}", buckets.join(", "))?;
    }
    if row.age_unknown > 0 {
        writeln!(out, "({} requests have no readable entry date.)", row.age_unknown)?;
    }
    writeln!(out, "\n---")?;

    writeln!(out, "### Historical Analysis ###")?;
    writeln!(out, "Over the analyzed period, the registry has cleared an average of:")?;
    for (size, rate) in row.avg_cleared_per_quarter.iter() {
        writeln!(out, "* **{rate:.1}** {size} blocks per quarter")?;
    }
    writeln!(out, "\n---")?;

    writeln!(out, "### Estimated Wait Time ###")?;
    writeln!(out, "Based on the current queue and historical rates:")?;
    for size in BlockSize::ALL {
        writeln!(out, "* **For a {size} network:**")?;
        writeln!(out, "    * There are **{} requests** in the queue.", row.requests.get(size))?;

        let rate = row.avg_cleared_per_quarter.get(size);
        if rate > 0.0 {
            writeln!(
                out,
                "    * At a rate of **{rate:.1} blocks cleared per quarter**, the estimated wait time is approximately **{} quarters**, or **{} years**.",
                format_estimate(row.estimated_quarters.get(size), 0),
                format_estimate(row.estimated_years.get(size), 1)
            )?;
        } else {
            writeln!(out, "    * No blocks of this size have cleared historically; the wait cannot be estimated (inf).")?;
        }
    }

    Ok(())
}
