use super::*;
use crate::clock::ManualClock;
use crate::queue::{EnqueueOptions, Order};

mod common;
use common::*;

mod probes;
mod provisioning;
