pub mod motion;

pub use motion::{
    buffer_end, buffer_start, down, left, line_end, line_end_at, line_start, line_start_at,
    right, up, word_backward, word_end, word_forward,
};
