mod cycle_test;
mod reference_test;
mod scenario_test;
