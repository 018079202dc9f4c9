use crate::VectraResult;
use crate::mask::BinaryMask;

/// A trait representing an algorithm that can turn a mask into a vector representation.
pub trait MaskVectorizer {
    type Options;
    type Output;

    fn vectorize(&self, mask: &BinaryMask, options: &Self::Options) -> VectraResult<Self::Output>;
}

pub mod polygon;
