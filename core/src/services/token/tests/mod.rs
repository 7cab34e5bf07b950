mod support;

mod codec_tests;
mod revocation_tests;
