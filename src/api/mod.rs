// Copyright 2024 the ota-receiver authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! APIs for the environment.
//!
//! The [environment](crate::env::Env) is split into components. Each component
//! has an API described by a trait. This module gathers the API of those
//! components.

pub mod partition;
pub mod restart;
pub mod writer;
