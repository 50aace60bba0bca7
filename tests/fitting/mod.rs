//! Tests for the beam-width fit.

mod beam_fit;
