mod director_tests;
mod health_tests;
mod shedding_tests;
mod support;
