mod helpers;
mod validation_test;
