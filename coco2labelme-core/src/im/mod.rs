mod mask;
mod rle;

pub use mask::BinaryMask;
pub use rle::Rle;
