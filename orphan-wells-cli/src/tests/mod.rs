//! Shared test harness modules for the orphan-wells CLI.

use super::*;

mod helpers;
