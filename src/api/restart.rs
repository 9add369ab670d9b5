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

/// Device restart capability.
pub trait Restart {
    /// Restarts the device so the committed partition gets booted.
    ///
    /// Hardware implementations do not return from this call. Test and host
    /// implementations may return, which the session controller tolerates by
    /// having nothing left to do for the finished session.
    fn restart(&mut self);
}
