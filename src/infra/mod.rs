pub mod ims;
