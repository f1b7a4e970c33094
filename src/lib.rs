// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Library entry exposing the front end and its command-line host.
pub mod cli;
pub mod core;
