use std::io::{self, Write};

use serde::Serialize;
use vc_core::Point3f;
use vc_search::{SearchOutcome, SearchStatus, TransformParams};

/// Terminal state of one cloud point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointStatus {
    /// The search converged inside the admissible range.
    #[serde(rename = "point_good")]
    Good,
    /// The displacement hit the `disp_max` bound.
    #[serde(rename = "range_fail")]
    RangeFail,
    /// The search hit its iteration cap or a degenerate objective.
    #[serde(rename = "convg_fail")]
    ConvergenceFail,
    /// Too little of the template survived masking and thresholding.
    #[serde(rename = "insufficient_volume")]
    InsufficientVolume,
    /// The run was cancelled before this point was reached.
    #[serde(rename = "not_processed")]
    NotProcessed,
}

impl PointStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "point_good",
            Self::RangeFail => "range_fail",
            Self::ConvergenceFail => "convg_fail",
            Self::InsufficientVolume => "insufficient_volume",
            Self::NotProcessed => "not_processed",
        }
    }

    pub fn is_good(self) -> bool {
        self == Self::Good
    }
}

impl From<SearchStatus> for PointStatus {
    fn from(s: SearchStatus) -> Self {
        match s {
            SearchStatus::Converged => Self::Good,
            SearchStatus::RangeFailed => Self::RangeFail,
            SearchStatus::ConvergenceFailed => Self::ConvergenceFail,
        }
    }
}

/// One output row: the point, its status and the found transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub status: PointStatus,
    pub obj_min: f32,
    pub u: f32,
    pub v: f32,
    pub w: f32,
    pub phi: f32,
    pub the: f32,
    pub psi: f32,
    pub exx: f32,
    pub eyy: f32,
    pub ezz: f32,
    pub exy: f32,
    pub eyz: f32,
    pub exz: f32,
    pub iterations: u32,
}

impl CorrelationResult {
    pub(crate) fn from_outcome(id: u32, pos: Point3f, outcome: &SearchOutcome) -> Self {
        Self::with_params(id, pos, outcome.status.into(), outcome.objective, &outcome.params)
            .iterations(outcome.iterations)
    }

    /// Row for a point that never reached the search.
    pub(crate) fn unsearched(id: u32, pos: Point3f, status: PointStatus) -> Self {
        Self::with_params(id, pos, status, f32::INFINITY, &TransformParams::identity())
    }

    fn with_params(
        id: u32,
        pos: Point3f,
        status: PointStatus,
        obj_min: f32,
        params: &TransformParams,
    ) -> Self {
        Self {
            id,
            x: pos.x,
            y: pos.y,
            z: pos.z,
            status,
            obj_min,
            u: params.translation.x,
            v: params.translation.y,
            w: params.translation.z,
            phi: params.rotation[0],
            the: params.rotation[1],
            psi: params.rotation[2],
            exx: params.strain[0],
            eyy: params.strain[1],
            ezz: params.strain[2],
            exy: params.strain[3],
            eyz: params.strain[4],
            exz: params.strain[5],
            iterations: 0,
        }
    }

    fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }
}

/// All result rows of one run, one per input point, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsTable {
    rows: Vec<CorrelationResult>,
}

impl ResultsTable {
    pub(crate) fn from_rows(rows: Vec<CorrelationResult>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CorrelationResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&CorrelationResult> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// `(good, range_fail, convg_fail, insufficient, not_processed)` counts.
    pub fn status_counts(&self) -> (usize, usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0, 0);
        for r in &self.rows {
            match r.status {
                PointStatus::Good => counts.0 += 1,
                PointStatus::RangeFail => counts.1 += 1,
                PointStatus::ConvergenceFail => counts.2 += 1,
                PointStatus::InsufficientVolume => counts.3 += 1,
                PointStatus::NotProcessed => counts.4 += 1,
            }
        }
        counts
    }

    /// Writes the classic tab-delimited displacement table.
    ///
    /// The column set follows the searched degrees of freedom: translation
    /// always, rotation from 6, strain from 12.
    pub fn write_delimited<W: Write>(&self, out: &mut W, num_dof: u32) -> io::Result<()> {
        write!(out, "n\tx\ty\tz\tstatus\tobj_min\tu\tv\tw")?;
        if num_dof >= 6 {
            write!(out, "\tphi\tthe\tpsi")?;
        }
        if num_dof >= 12 {
            write!(out, "\texx\teyy\tezz\texy\teyz\texz")?;
        }
        writeln!(out)?;

        for r in &self.rows {
            write!(
                out,
                "{}\t{:.3}\t{:.3}\t{:.3}\t{}\t{:.6e}\t{:.6}\t{:.6}\t{:.6}",
                r.id,
                r.x,
                r.y,
                r.z,
                r.status.as_str(),
                r.obj_min,
                r.u,
                r.v,
                r.w
            )?;
            if num_dof >= 6 {
                write!(out, "\t{:.6}\t{:.6}\t{:.6}", r.phi, r.the, r.psi)?;
            }
            if num_dof >= 12 {
                write!(
                    out,
                    "\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
                    r.exx, r.eyy, r.ezz, r.exy, r.eyz, r.exz
                )?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use vc_core::Point3f;

    use super::{CorrelationResult, PointStatus, ResultsTable};

    fn row(id: u32, status: PointStatus) -> CorrelationResult {
        CorrelationResult::unsearched(id, Point3f::new(1.0, 2.0, 3.0), status)
    }

    #[test]
    fn status_strings() {
        assert_eq!(PointStatus::Good.as_str(), "point_good");
        assert_eq!(PointStatus::RangeFail.as_str(), "range_fail");
        assert_eq!(PointStatus::ConvergenceFail.as_str(), "convg_fail");
        assert!(PointStatus::Good.is_good());
        assert!(!PointStatus::NotProcessed.is_good());
    }

    #[test]
    fn lookup_and_counts() {
        let table = ResultsTable::from_rows(vec![
            row(1, PointStatus::Good),
            row(2, PointStatus::RangeFail),
            row(3, PointStatus::Good),
            row(7, PointStatus::InsufficientVolume),
        ]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(7).unwrap().status, PointStatus::InsufficientVolume);
        assert!(table.get(4).is_none());
        assert_eq!(table.status_counts(), (2, 1, 0, 1, 0));
    }

    #[test]
    fn delimited_header_tracks_dof() {
        let table = ResultsTable::from_rows(vec![row(1, PointStatus::Good)]);

        let mut buf3 = Vec::new();
        table.write_delimited(&mut buf3, 3).unwrap();
        let text3 = String::from_utf8(buf3).unwrap();
        assert!(text3.starts_with("n\tx\ty\tz\tstatus\tobj_min\tu\tv\tw\n"));
        assert!(!text3.contains("phi"));

        let mut buf12 = Vec::new();
        table.write_delimited(&mut buf12, 12).unwrap();
        let text12 = String::from_utf8(buf12).unwrap();
        assert!(text12.lines().next().unwrap().ends_with("exz"));
        assert_eq!(text12.lines().count(), 2);
    }
}
