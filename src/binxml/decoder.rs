use crate::binxml::cursor::ByteCursor;
use crate::binxml::name::read_name;
use crate::err::{DeserializationError, DeserializationResult};
use crate::kv_output::KvEmitter;
use crate::tables::EventTables;
use crate::template_registry::TemplateRegistry;

use log::{trace, warn};

/// Element/attribute nesting deeper than this is clamped, not failed.
pub(crate) const MAX_NAME_STACK_DEPTH: usize = 20;

/// Template bodies and nested binxml arguments recurse; crafted inputs must
/// not be able to exhaust the call stack.
pub(crate) const MAX_BINXML_NESTING: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XmlState {
    Normal,
    InAttribute,
}

/// Per-stream parse state. A template body or a nested binxml argument gets
/// its own `StreamCtx` over its own byte range; the name stack and the
/// template registry are shared through the decoder.
pub(crate) struct StreamCtx<'a> {
    pub(crate) cursor: ByteCursor<'a>,
    pub(crate) state: XmlState,
    pub(crate) cached_value: String,
    pub(crate) current_template: Option<usize>,
}

pub(crate) struct BinXmlDecoder<'a> {
    /// The full chunk buffer; name references resolve against it no matter
    /// which sub-stream is being parsed.
    pub(crate) chunk: &'a [u8],
    pub(crate) registry: &'a mut TemplateRegistry,
    pub(crate) tables: &'a EventTables,
    pub(crate) name_stack: Vec<String>,
    pub(crate) depth: u8,
}

/// Decode one record's binxml payload, emitting its key/value pairs into
/// `out`.
///
/// `payload_offset`/`payload_len` locate the payload within `chunk`;
/// name references and template definitions resolve against the same chunk
/// buffer. The registry accumulates template definitions across the records
/// of one chunk and must be reset before the next chunk.
pub fn decode_record(
    chunk: &[u8],
    payload_offset: usize,
    payload_len: usize,
    registry: &mut TemplateRegistry,
    tables: &EventTables,
    out: &mut String,
) -> DeserializationResult<()> {
    let end = payload_offset
        .checked_add(payload_len)
        .filter(|&end| end <= chunk.len())
        .ok_or(DeserializationError::UnexpectedEof {
            t: "record payload",
            offset: payload_offset as u64,
            need: payload_len,
            have: chunk.len().saturating_sub(payload_offset),
        })?;

    let mut decoder = BinXmlDecoder {
        chunk,
        registry,
        tables,
        name_stack: Vec::new(),
        depth: 0,
    };

    let mut stream = StreamCtx {
        cursor: ByteCursor::new(&chunk[payload_offset..end], payload_offset),
        state: XmlState::Normal,
        cached_value: String::new(),
        current_template: None,
    };

    let mut emitter = KvEmitter::new(out);
    decoder.parse_stream(&mut stream, &mut emitter)
}

impl<'a> BinXmlDecoder<'a> {
    /// Walk one binxml token stream until its end or an EOF token.
    pub(crate) fn parse_stream(
        &mut self,
        ctx: &mut StreamCtx<'a>,
        emitter: &mut KvEmitter<'_>,
    ) -> DeserializationResult<()> {
        ctx.state = XmlState::Normal;

        while ctx.cursor.remaining() > 0 {
            let token_offset = ctx.cursor.chunk_position();
            let tag = ctx.cursor.u8("binxml token")?;
            trace!("offset {:#06x}: token {:02x}", token_offset, tag);

            match tag {
                // EndOfStream
                0x00 => ctx.cursor.exhaust(),
                // OpenStartElement, with/without an attribute list
                0x01 => self.open_start_element(ctx, false)?,
                0x41 => self.open_start_element(ctx, true)?,
                // CloseStartElement
                0x02 => self.set_state(ctx, XmlState::Normal),
                // CloseEmptyElement / CloseElement
                0x03 | 0x04 => {
                    self.set_state(ctx, XmlState::Normal);
                    self.pop_name();
                }
                // ValueText
                0x05 | 0x45 => self.value_text(ctx)?,
                // Attribute
                0x06 | 0x46 => self.attribute(ctx)?,
                // CDATA / CharRef / EntityRef / PITarget / PIData: tolerated
                0x07..=0x0b | 0x47..=0x49 => {}
                // TemplateInstance
                0x0c => self.template_instance(ctx, emitter)?,
                // Normal / Optional substitution
                0x0d | 0x0e => self.substitution(ctx)?,
                // FragmentHeader: version major/minor and flags
                0x0f => ctx.cursor.skip(3),
                value => {
                    return Err(DeserializationError::InvalidToken {
                        value,
                        offset: token_offset,
                    });
                }
            }
        }

        Ok(())
    }

    fn open_start_element(
        &mut self,
        ctx: &mut StreamCtx<'a>,
        has_attribute_list: bool,
    ) -> DeserializationResult<()> {
        let _dependency_id = ctx.cursor.u16("open_start_element.dependency_id")?;
        // Loop termination is driven by the stream length, not this field.
        let _element_len = ctx.cursor.u32("open_start_element.data_size")?;
        let name = read_name(&mut ctx.cursor, self.chunk)?;
        if has_attribute_list {
            let _attribute_list_len = ctx.cursor.u32("open_start_element.attribute_list_len")?;
        }

        self.push_name(name);
        Ok(())
    }

    fn value_text(&mut self, ctx: &mut StreamCtx<'a>) -> DeserializationResult<()> {
        let _string_type = ctx.cursor.u8("value_text.string_type")?;
        let value = ctx
            .cursor
            .len_prefixed_utf16_string(false, "value_text.string")?;

        if !self.name_stack.is_empty() {
            let key = self.proper_key_name(ctx);
            // The text of a `Name` attribute under `Data` is consumed
            // implicitly through the cached value; emitting it as its own
            // pair would duplicate the synthesized key.
            let suppressed = key == "Name" && self.upper_name() == Some("Data");
            if !suppressed {
                if let Some(idx) = ctx.current_template {
                    self.registry.register_fixed_pair(idx, &key, &value);
                }
            }
        }

        self.set_state(ctx, XmlState::Normal);
        ctx.cached_value = value;
        Ok(())
    }

    fn attribute(&mut self, ctx: &mut StreamCtx<'a>) -> DeserializationResult<()> {
        let name = read_name(&mut ctx.cursor, self.chunk)?;
        self.push_name(name);
        self.set_state(ctx, XmlState::InAttribute);
        Ok(())
    }

    fn substitution(&mut self, ctx: &mut StreamCtx<'a>) -> DeserializationResult<()> {
        let substitution_id = ctx.cursor.u16("substitution.id")?;
        let mut value_type = ctx.cursor.u8("substitution.value_type")?;
        if value_type == 0x00 {
            value_type = ctx.cursor.u8("substitution.value_type")?;
        }

        // An empty key is a known corruption pattern and is registered as-is.
        let key = self.proper_key_name(ctx);
        if let Some(idx) = ctx.current_template {
            self.registry
                .register_arg_pair(idx, &key, u16::from(value_type), substitution_id);
        }

        self.set_state(ctx, XmlState::Normal);
        Ok(())
    }

    /// Token 0x0c: resolve (or materialize) the template, emit its fixed
    /// pairs, then bind and render the instance's argument vector.
    fn template_instance(
        &mut self,
        ctx: &mut StreamCtx<'a>,
        emitter: &mut KvEmitter<'_>,
    ) -> DeserializationResult<()> {
        let offset = ctx.cursor.chunk_position();
        let discriminant = ctx.cursor.u8("template_instance.discriminant")?;
        if discriminant != 0x01 {
            return Err(DeserializationError::MalformedTemplateInstance {
                value: discriminant,
                offset,
            });
        }

        let short_id = ctx.cursor.u32("template_instance.short_id")?;
        let _resource_len = ctx.cursor.u32("template_instance.resource_len")?;
        let mut num_arguments = ctx.cursor.u32("template_instance.num_arguments")?;

        let mut template_idx = self.registry.lookup(short_id);

        if template_idx.is_none() {
            // First sight of this id: the definition body is inlined, and
            // the argument count is repeated after it.
            let _long_id = ctx.cursor.take_bytes(16, "template_definition.long_id")?;
            let body_len = ctx.cursor.u32("template_definition.body_len")? as usize;
            let body_base = ctx.cursor.chunk_position();
            let body = ctx.cursor.peek_bytes(body_len, "template_definition.body")?;

            trace!(
                "materializing template {:08x}, body {} bytes at {:#06x}",
                short_id,
                body_len,
                body_base
            );

            if self.depth >= MAX_BINXML_NESTING {
                return Err(DeserializationError::RecursionLimitExceeded {
                    limit: MAX_BINXML_NESTING,
                    offset: body_base,
                });
            }

            let mut body_ctx = StreamCtx {
                cursor: ByteCursor::new(body, body_base as usize),
                state: XmlState::Normal,
                cached_value: String::new(),
                current_template: self.registry.insert(short_id),
            };

            self.depth += 1;
            let body_result = self.parse_stream(&mut body_ctx, emitter);
            self.depth -= 1;
            body_result.map_err(|e| DeserializationError::FailedToParseTemplateBody {
                offset: body_base,
                source: Box::new(e),
            })?;

            ctx.cursor.skip(body_len);
            num_arguments = ctx.cursor.u32("template_instance.num_arguments")?;
            template_idx = body_ctx.current_template;
        }

        ctx.current_template = template_idx;

        // Clone the pair lists out of the registry: a nested binxml argument
        // re-enters the decoder, which needs the registry back.
        let (fixed_pairs, arg_pairs) = match template_idx {
            Some(idx) => {
                let template = self.registry.get(idx);
                (
                    template.fixed_pairs().to_vec(),
                    template.arg_pairs().to_vec(),
                )
            }
            None => (Vec::new(), Vec::new()),
        };

        for (key, value) in &fixed_pairs {
            self.emit_fixed_pair(key, value, emitter);
        }

        let entry_count = num_arguments as usize;
        if entry_count.saturating_mul(4) > ctx.cursor.remaining() {
            return Err(DeserializationError::OversizedArgumentMap {
                num_arguments,
                have: ctx.cursor.remaining(),
                offset: ctx.cursor.chunk_position(),
            });
        }

        let mut argument_map = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let arg_len = ctx.cursor.u16("argument_map.len")?;
            let arg_type = ctx.cursor.u16("argument_map.type")?;
            argument_map.push((arg_len, arg_type));
        }

        for (argument_idx, &(arg_len, arg_type)) in argument_map.iter().enumerate() {
            // Arguments without a registered placeholder are present in the
            // vector but unreferenced by the template body; skip their bytes.
            match arg_pairs
                .iter()
                .find(|pair| usize::from(pair.arg_index) == argument_idx)
            {
                None => ctx.cursor.skip(usize::from(arg_len)),
                Some(pair) => self.render_argument(ctx, pair, arg_type, arg_len, emitter)?,
            }
        }

        Ok(())
    }

    /// Emit a fixed pair, annotating a numeric `EventID` when its
    /// description is known.
    pub(crate) fn emit_fixed_pair(&self, key: &str, value: &str, emitter: &mut KvEmitter<'_>) {
        if key == "EventID" {
            if let Some(event_id) = leading_decimal_u16(value) {
                if event_id != 0 {
                    if let Some(description) = self.tables.event_description(event_id) {
                        emitter.token(format_args!("'{}':{} ({}), ", key, event_id, description));
                        return;
                    }
                }
            }
        }

        emitter.literal(key, value);
    }

    /// The key an emitted pair should carry at the current nesting.
    ///
    /// `<Data Name="x">` under `EventData` synthesizes `x` as the key: the
    /// `Name` attribute's text was the last value seen, so the cached value
    /// substitutes for the literal element name. The match is case-sensitive;
    /// localized element names fall through to the literal `Data`.
    pub(crate) fn proper_key_name(&self, ctx: &StreamCtx<'a>) -> String {
        let key = self.top_name().unwrap_or("");

        if key == "Data" && self.upper_name() == Some("EventData") && !ctx.cached_value.is_empty()
        {
            return ctx.cached_value.clone();
        }

        key.to_owned()
    }

    pub(crate) fn set_state(&mut self, ctx: &mut StreamCtx<'a>, new_state: XmlState) {
        if ctx.state == new_state {
            return;
        }
        if ctx.state == XmlState::InAttribute {
            self.pop_name();
        }
        ctx.state = new_state;
    }

    pub(crate) fn push_name(&mut self, name: String) {
        if self.name_stack.len() >= MAX_NAME_STACK_DEPTH {
            warn!("name stack overflow, dropping {:?}", name);
            return;
        }
        self.name_stack.push(name);
    }

    pub(crate) fn pop_name(&mut self) {
        self.name_stack.pop();
    }

    pub(crate) fn top_name(&self) -> Option<&str> {
        self.name_stack.last().map(String::as_str)
    }

    pub(crate) fn upper_name(&self) -> Option<&str> {
        self.name_stack
            .len()
            .checked_sub(2)
            .map(|idx| self.name_stack[idx].as_str())
    }
}

/// `strtoul`-style leading-digits parse; trailing junk is ignored.
fn leading_decimal_u16(s: &str) -> Option<u16> {
    let s = s.trim_start();
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u16>().ok()
}
