//! Spatial rendering of per-diode series onto the detector grid.
//!
//! Rendering is a scatter through the shared geometry: populated cells
//! take their diode's value and every other cell stays zero. Frames are
//! independent, so the whole-series stack can run across a thread pool
//! without reordering the output.

use dosim_types::error::{DosimError, DosimResult};
use dosim_types::geometry::DetectorGeometry;
use dosim_types::series::FrameSeries;
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, Zip};

/// Render one frame onto the detector grid.
pub fn frame_to_grid(
    frame: ArrayView1<'_, f64>,
    geometry: &DetectorGeometry,
) -> DosimResult<Array2<f64>> {
    if frame.len() != geometry.diode_count() {
        return Err(DosimError::ShapeMismatch {
            what: "frame",
            expected: geometry.diode_count(),
            got: frame.len(),
        });
    }
    let mut grid = Array2::zeros((geometry.rows(), geometry.cols()));
    scatter_frame(frame, geometry.positions(), grid.view_mut());
    Ok(grid)
}

/// Collapse a grid back into linear diode order, ignoring unpopulated
/// cells.
pub fn grid_to_frame(
    grid: &Array2<f64>,
    geometry: &DetectorGeometry,
) -> DosimResult<Array1<f64>> {
    if grid.nrows() != geometry.rows() {
        return Err(DosimError::ShapeMismatch {
            what: "grid rows",
            expected: geometry.rows(),
            got: grid.nrows(),
        });
    }
    if grid.ncols() != geometry.cols() {
        return Err(DosimError::ShapeMismatch {
            what: "grid cols",
            expected: geometry.cols(),
            got: grid.ncols(),
        });
    }
    let mut frame = Array1::zeros(geometry.diode_count());
    for (diode, &(row, col)) in geometry.positions().iter().enumerate() {
        frame[diode] = grid[[row, col]];
    }
    Ok(frame)
}

/// Stack a whole series into a (frames, rows, cols) tensor in frame
/// order.
pub fn stack_series(
    series: &FrameSeries,
    geometry: &DetectorGeometry,
) -> DosimResult<Array3<f64>> {
    series.expect_diode_count(geometry.diode_count())?;
    let mut stack = Array3::zeros((series.n_frames(), geometry.rows(), geometry.cols()));
    let positions = geometry.positions();
    for (slab, frame) in stack.outer_iter_mut().zip(series.values.outer_iter()) {
        scatter_frame(frame, positions, slab);
    }
    Ok(stack)
}

/// `stack_series` parallelized across frames. Output order is identical;
/// only the work schedule differs.
pub fn stack_series_par(
    series: &FrameSeries,
    geometry: &DetectorGeometry,
) -> DosimResult<Array3<f64>> {
    series.expect_diode_count(geometry.diode_count())?;
    let mut stack = Array3::zeros((series.n_frames(), geometry.rows(), geometry.cols()));
    let positions = geometry.positions();
    Zip::from(stack.axis_iter_mut(Axis(0)))
        .and(series.values.axis_iter(Axis(0)))
        .par_for_each(|slab, frame| scatter_frame(frame, positions, slab));
    Ok(stack)
}

fn scatter_frame(
    frame: ArrayView1<'_, f64>,
    positions: &[(usize, usize)],
    mut slab: ndarray::ArrayViewMut2<'_, f64>,
) {
    for (diode, &(row, col)) in positions.iter().enumerate() {
        slab[[row, col]] = frame[diode];
    }
}
