// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — NPZ Stack Persistence
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! NumPy `.npz` persistence for stacked detector volumes.
//!
//! One archive member per frame, named `arr_0`, `arr_1`, … in frame
//! order. That is the `savez` positional convention, so stacks written
//! here load directly in NumPy and stacks exported by NumPy load here.

use std::fs::File;
use std::path::Path;

use dosim_types::error::{DosimError, DosimResult};
use ndarray::{Array2, Array3, Axis};
use ndarray_npy::{NpzReader, NpzWriter};

/// Write a (frames, rows, cols) stack, one member per frame.
pub fn write_stack(path: &Path, stack: &Array3<f64>) -> DosimResult<()> {
    let file = File::create(path)?;
    let mut writer = NpzWriter::new(file);
    for (i, slab) in stack.axis_iter(Axis(0)).enumerate() {
        writer
            .add_array(format!("arr_{i}").as_str(), &slab)
            .map_err(|e| DosimError::Npz(format!("Failed to write arr_{i}: {e}")))?;
    }
    writer
        .finish()
        .map_err(|e| DosimError::Npz(format!("Failed to finish npz archive: {e}")))?;
    Ok(())
}

/// Read a stack written by `write_stack` (or NumPy `savez`).
///
/// Members are read in index order; every frame must share one shape,
/// and an archive without `arr_0` has no stack in it.
pub fn read_stack(path: &Path) -> DosimResult<Array3<f64>> {
    let file = File::open(path)?;
    let mut npz = NpzReader::new(file)
        .map_err(|e| DosimError::Npz(format!("Failed to open npz '{}': {e}", path.display())))?;
    let n_frames = npz
        .names()
        .map_err(|e| DosimError::Npz(format!("Failed to list npz members: {e}")))?
        .len();
    if n_frames == 0 {
        return Err(DosimError::MissingArray {
            name: "arr_0".to_string(),
        });
    }

    let first = read_frame(&mut npz, 0)?;
    let (rows, cols) = first.dim();
    let mut stack = Array3::zeros((n_frames, rows, cols));
    stack.index_axis_mut(Axis(0), 0).assign(&first);

    for i in 1..n_frames {
        let frame = read_frame(&mut npz, i)?;
        if frame.nrows() != rows {
            return Err(DosimError::ShapeMismatch {
                what: "stack frame rows",
                expected: rows,
                got: frame.nrows(),
            });
        }
        if frame.ncols() != cols {
            return Err(DosimError::ShapeMismatch {
                what: "stack frame cols",
                expected: cols,
                got: frame.ncols(),
            });
        }
        stack.index_axis_mut(Axis(0), i).assign(&frame);
    }
    Ok(stack)
}

fn read_frame(npz: &mut NpzReader<File>, i: usize) -> DosimResult<Array2<f64>> {
    npz.by_name::<ndarray::OwnedRepr<f64>, ndarray::Ix2>(&format!("arr_{i}.npy"))
        .or_else(|_| npz.by_name::<ndarray::OwnedRepr<f64>, ndarray::Ix2>(&format!("arr_{i}")))
        .map_err(|_| DosimError::MissingArray {
            name: format!("arr_{i}"),
        })
}
