pub mod cplv;
pub mod fft;
pub mod generator;
pub mod identity;
pub mod linalg;
pub mod phase;
pub mod projector;
pub mod validator;
pub mod wavelet;
pub mod weights;
