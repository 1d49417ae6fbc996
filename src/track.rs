//! Track Assembler (`spec.md` §4.2): produces a contiguous sector
//! buffer from the raw image bytes, de-interleaving double-sided
//! images where needed.
#![warn(missing_docs)]
#![warn(unsafe_code)]
use log::debug;

use crate::error::{Error, ErrorKind};
use crate::format::ImageVariant;

/// Assemble the sector buffer for `variant` from the raw image bytes.
///
/// For non-interleaved variants this simply copies the first
/// `variant.buffer_len()` bytes. For [`ImageVariant::Adl`], tracks are
/// physically stored side-0/side-1 interleaved per track and are
/// reordered here into flat side-0 tracks followed by flat side-1
/// tracks.
pub fn assemble(variant: ImageVariant, data: &[u8]) -> Result<Vec<u8>, Error> {
    let ntracks = variant.ntracks();
    let track_size = variant.nsectors() * variant.sector_size();
    let required = ntracks * track_size;

    if data.len() < required {
        return Err(Error::new(ErrorKind::TruncatedImage(format!(
            "expected at least {} bytes, found {}",
            required,
            data.len()
        ))));
    }

    if !variant.interleaved() {
        debug!("Assembling {} tracks without de-interleaving", ntracks);
        return Ok(data[..required].to_vec());
    }

    debug!("De-interleaving {} tracks for {:?}", ntracks, variant);
    let mut buffer = Vec::with_capacity(required);
    let half = ntracks / 2;

    for i in 0..ntracks {
        let physical_track = if i < half {
            2 * i
        } else {
            2 * (i - half) + 1
        };

        let start = physical_track * track_size;
        let end = start + track_size;
        if end > data.len() {
            return Err(Error::new(ErrorKind::TruncatedImage(format!(
                "missing physical track {} while de-interleaving",
                physical_track
            ))));
        }
        buffer.extend_from_slice(&data[start..end]);
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interleaved_copies_sequentially() {
        let variant = ImageVariant::AdfS;
        let data = vec![7u8; variant.buffer_len()];
        let buffer = assemble(variant, &data).unwrap();
        assert_eq!(buffer.len(), variant.buffer_len());
        assert!(buffer.iter().all(|&b| b == 7));
    }

    #[test]
    fn truncated_image_is_rejected() {
        let variant = ImageVariant::AdfM;
        let data = vec![0u8; variant.buffer_len() - 1];
        assert!(assemble(variant, &data).is_err());
    }

    #[test]
    fn interleaved_round_trips_to_flat_layout() {
        let variant = ImageVariant::Adl;
        let track_size = variant.nsectors() * variant.sector_size();
        let ntracks = variant.ntracks();
        let half = ntracks / 2;

        // Build physical (interleaved) data where each track is
        // filled with a byte equal to its logical track number, so we
        // can check the reordering independent of side.
        let mut physical = vec![0u8; ntracks * track_size];
        for i in 0..half {
            let side0_value = i as u8;
            let side1_value = (half + i) as u8;
            physical[2 * i * track_size..2 * i * track_size + track_size]
                .iter_mut()
                .for_each(|b| *b = side0_value);
            physical[(2 * i + 1) * track_size..(2 * i + 1) * track_size + track_size]
                .iter_mut()
                .for_each(|b| *b = side1_value);
        }

        let flat = assemble(variant, &physical).unwrap();

        for i in 0..ntracks {
            let expected = i as u8;
            let track = &flat[i * track_size..(i + 1) * track_size];
            assert!(
                track.iter().all(|&b| b == expected),
                "track {} not correctly de-interleaved",
                i
            );
        }
    }
}
