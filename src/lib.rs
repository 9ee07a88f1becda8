// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod apis;
pub mod config;
pub mod discord;
pub mod logging;
pub mod model;
pub mod suggestions;
pub mod text;
pub mod tickets;
