// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod address_layout;
mod authorization;
mod config_extraction;
mod image_coordinates;
